use fishtank_engine::{DropTuning, Rect, Vec2};

use super::economy::Money;

/// Falling pickups: chum, poop and coins.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Perishable {
    fall_rate: f32,
    heal_amount: f32,
    coin_value: Money,
    redeemed: bool,
}

impl Perishable {
    pub(crate) fn from_tuning(tuning: &DropTuning) -> Self {
        Self {
            fall_rate: tuning.fall_rate,
            heal_amount: tuning.heal_amount,
            coin_value: tuning.coin_value,
            redeemed: false,
        }
    }

    pub(crate) fn heal_amount(&self) -> f32 {
        self.heal_amount
    }

    pub(crate) fn coin_value(&self) -> Money {
        self.coin_value
    }

    pub(crate) fn is_redeemed(&self) -> bool {
        self.redeemed
    }

    /// Moves down the screen. Returns true once below the bottom edge.
    pub(crate) fn fall(&self, position: &mut Vec2, dt_seconds: f32, screen_height: f32) -> bool {
        position.y += self.fall_rate * dt_seconds;
        position.y > screen_height
    }

    /// Redeems on the first click inside `hitbox`; later clicks miss.
    pub(crate) fn hit_test(&mut self, hitbox: Rect, point: Vec2) -> bool {
        if self.redeemed || !hitbox.contains(point) {
            return false;
        }
        self.redeemed = true;
        true
    }
}
