use fishtank_engine::Scene;

mod agent;
mod catalog;
mod drops;
mod economy;
mod entity;
mod observers;
mod scene_impl;
mod store;
mod world;

pub(crate) fn build_scene(seed: u64) -> Box<dyn Scene> {
    Box::new(scene_impl::TankScene::new(seed))
}
