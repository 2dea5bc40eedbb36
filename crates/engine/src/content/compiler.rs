use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use roxmltree::{Document, Node};

use crate::sprite_keys::validate_sprite_key;
use crate::AppPaths;

use super::database::{
    AgentTuning, ArchetypeTuning, CoinDrop, DefDatabase, DropTuning, EntityArchetype,
    EntityCategory, EntityDefId,
};
use super::discovery::{discover_mod_sources, ModSource};
use super::types::{ContentPlanError, ContentPlanRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentErrorCode {
    Discovery,
    ReadFile,
    XmlMalformed,
    InvalidRoot,
    UnknownDefType,
    UnknownField,
    DuplicateField,
    MissingField,
    InvalidValue,
    CategoryMismatch,
    DuplicateDefInMod,
    UnresolvedReference,
}

#[derive(Debug, Clone)]
pub struct ContentCompileError {
    pub code: ContentErrorCode,
    pub message: String,
    pub mod_id: String,
    pub file_path: PathBuf,
    pub location: Option<SourceLocation>,
}

impl fmt::Display for ContentCompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location {
            Some(loc) => write!(
                f,
                "{:?}: {} (mod={}, file={}, line={}, column={})",
                self.code,
                self.message,
                self.mod_id,
                self.file_path.display(),
                loc.line,
                loc.column
            ),
            None => write!(
                f,
                "{:?}: {} (mod={}, file={})",
                self.code,
                self.message,
                self.mod_id,
                self.file_path.display()
            ),
        }
    }
}

impl std::error::Error for ContentCompileError {}

const COMMON_FIELDS: &[&str] = &["defName", "label", "sprite", "category", "cost"];
const AGENT_FIELDS: &[&str] = &[
    "maxHealth",
    "attrition",
    "speed",
    "coinInterval",
    "coinDrops",
    "preferredPrey",
];
const FOOD_FIELDS: &[&str] = &["fallRate", "healAmount"];
const COIN_FIELDS: &[&str] = &["fallRate", "coinValue"];

fn category_fields(category: EntityCategory) -> &'static [&'static str] {
    match category {
        EntityCategory::Agent => AGENT_FIELDS,
        EntityCategory::Chum | EntityCategory::Poop => FOOD_FIELDS,
        EntityCategory::Coin => COIN_FIELDS,
    }
}

#[derive(Debug, Clone)]
struct PendingEntityDef {
    def_name: String,
    label: String,
    sprite: String,
    category: EntityCategory,
    cost: Option<i64>,
    tuning: ArchetypeTuning,
    mod_id: String,
    file_path: PathBuf,
    location: Option<SourceLocation>,
}

#[derive(Debug, Default)]
struct EntityDefFields {
    def_name: Option<String>,
    label: Option<String>,
    sprite: Option<String>,
    category: Option<EntityCategory>,
    cost: Option<i64>,
    max_health: Option<f32>,
    attrition: Option<f32>,
    speed: Option<f32>,
    coin_interval: Option<f32>,
    coin_drops: Option<Vec<CoinDrop>>,
    preferred_prey: Option<EntityCategory>,
    fall_rate: Option<f32>,
    heal_amount: Option<f32>,
    coin_value: Option<i64>,
}

pub fn compile_def_database(
    app_paths: &AppPaths,
    request: &ContentPlanRequest,
) -> Result<DefDatabase, ContentCompileError> {
    let sources = discover_mod_sources(app_paths, request)
        .map_err(|error| map_discovery_error(error, &app_paths.root))?;
    compile_mod_sources(&sources)
}

/// Compiles a single in-memory defs document as if it were the only file of
/// `mod_id`.
pub fn compile_def_database_from_str(
    mod_id: &str,
    file_path: &Path,
    raw: &str,
) -> Result<DefDatabase, ContentCompileError> {
    let mut merged = BTreeMap::<String, PendingEntityDef>::new();
    let mut seen_in_mod = HashSet::<String>::new();
    let defs = parse_defs_document(mod_id, file_path, raw)?;
    merge_mod_defs(mod_id, file_path, defs, &mut seen_in_mod, &mut merged)?;
    finalize_defs(merged)
}

pub(crate) fn compile_mod_sources(
    sources: &[ModSource],
) -> Result<DefDatabase, ContentCompileError> {
    let mut merged = BTreeMap::<String, PendingEntityDef>::new();

    for source in sources {
        let xml_files = collect_xml_files_sorted(&source.source_dir)
            .map_err(|error| read_error(&source.mod_id, error.path, error.source))?;
        let mut seen_in_mod = HashSet::<String>::new();

        for xml_file in xml_files {
            let raw = fs::read_to_string(&xml_file)
                .map_err(|source_err| read_error(&source.mod_id, xml_file.clone(), source_err))?;
            let defs = parse_defs_document(&source.mod_id, &xml_file, &raw)?;
            merge_mod_defs(
                &source.mod_id,
                &xml_file,
                defs,
                &mut seen_in_mod,
                &mut merged,
            )?;
        }
    }

    finalize_defs(merged)
}

fn merge_mod_defs(
    mod_id: &str,
    file_path: &Path,
    defs: Vec<PendingEntityDef>,
    seen_in_mod: &mut HashSet<String>,
    merged: &mut BTreeMap<String, PendingEntityDef>,
) -> Result<(), ContentCompileError> {
    for def in defs {
        if !seen_in_mod.insert(def.def_name.clone()) {
            return Err(ContentCompileError {
                code: ContentErrorCode::DuplicateDefInMod,
                message: format!(
                    "duplicate EntityDef '{}' in mod '{}'; each mod may define a defName only once",
                    def.def_name, mod_id
                ),
                mod_id: mod_id.to_string(),
                file_path: file_path.to_path_buf(),
                location: def.location,
            });
        }
        // Cross-mod duplicates are override points (last mod wins).
        merged.insert(def.def_name.clone(), def);
    }
    Ok(())
}

fn finalize_defs(
    merged: BTreeMap<String, PendingEntityDef>,
) -> Result<DefDatabase, ContentCompileError> {
    for def in merged.values() {
        let ArchetypeTuning::Agent(agent) = &def.tuning else {
            continue;
        };
        for drop in &agent.coin_drops {
            let (code, message) = match merged.get(&drop.def_name) {
                Some(target) if target.category == EntityCategory::Coin => continue,
                Some(target) => (
                    ContentErrorCode::CategoryMismatch,
                    format!(
                        "coinDrops of '{}' lists '{}', which is a {} def; expected Coin",
                        def.def_name, drop.def_name, target.category
                    ),
                ),
                None => (
                    ContentErrorCode::UnresolvedReference,
                    format!(
                        "coinDrops of '{}' lists unknown def '{}'",
                        def.def_name, drop.def_name
                    ),
                ),
            };
            return Err(ContentCompileError {
                code,
                message,
                mod_id: def.mod_id.clone(),
                file_path: def.file_path.clone(),
                location: def.location,
            });
        }
    }

    let entity_defs = merged
        .into_values()
        .map(|def| EntityArchetype {
            id: EntityDefId(0),
            def_name: def.def_name,
            label: def.label,
            sprite: def.sprite,
            category: def.category,
            cost: def.cost,
            tuning: def.tuning,
        })
        .collect::<Vec<_>>();

    Ok(DefDatabase::from_entity_defs(entity_defs))
}

/// One parsed XML file plus the context every error needs.
struct DefsFile<'a, 'input> {
    mod_id: &'a str,
    file_path: &'a Path,
    doc: &'a Document<'input>,
}

fn parse_defs_document(
    mod_id: &str,
    file_path: &Path,
    raw: &str,
) -> Result<Vec<PendingEntityDef>, ContentCompileError> {
    let doc = Document::parse(raw).map_err(|error| ContentCompileError {
        code: ContentErrorCode::XmlMalformed,
        message: format!("malformed XML: {error}"),
        mod_id: mod_id.to_string(),
        file_path: file_path.to_path_buf(),
        location: Some(SourceLocation {
            line: error.pos().row as usize,
            column: error.pos().col as usize,
        }),
    })?;
    let file = DefsFile {
        mod_id,
        file_path,
        doc: &doc,
    };

    let root = doc.root_element();
    if root.tag_name().name() != "Defs" {
        return Err(file.error_at(
            ContentErrorCode::InvalidRoot,
            "root element must be <Defs>".to_string(),
            root,
        ));
    }

    let mut defs = Vec::<PendingEntityDef>::new();
    for child in root.children().filter(|node| node.is_element()) {
        if child.tag_name().name() != "EntityDef" {
            return Err(file.error_at(
                ContentErrorCode::UnknownDefType,
                format!(
                    "unsupported def type <{}>; only <EntityDef> is supported",
                    child.tag_name().name()
                ),
                child,
            ));
        }
        defs.push(file.parse_entity_def(child)?);
    }

    Ok(defs)
}

impl<'a, 'input> DefsFile<'a, 'input> {
    fn parse_entity_def(&self, node: Node<'_, '_>) -> Result<PendingEntityDef, ContentCompileError> {
        let mut seen_fields = HashSet::<String>::new();
        let mut fields = EntityDefFields::default();

        for field in node.children().filter(|child| child.is_element()) {
            let field_name = field.tag_name().name().to_string();
            if !seen_fields.insert(field_name.clone()) {
                return Err(self.error_at(
                    ContentErrorCode::DuplicateField,
                    format!("duplicate field <{}> in <EntityDef>", field_name),
                    field,
                ));
            }

            match field_name.as_str() {
                "defName" => fields.def_name = Some(self.required_text(field, "defName")?),
                "label" => fields.label = Some(self.required_text(field, "label")?),
                "sprite" => {
                    let value = self.required_text(field, "sprite")?;
                    if let Err(error) = validate_sprite_key(&value) {
                        return Err(self.error_at(
                            ContentErrorCode::InvalidValue,
                            format!("invalid sprite '{}': {}", value, error),
                            field,
                        ));
                    }
                    fields.sprite = Some(value);
                }
                "category" => fields.category = Some(self.category(field, "category")?),
                "cost" => fields.cost = Some(self.non_negative_i64(field, "cost")?),
                "maxHealth" => fields.max_health = Some(self.positive_f32(field, "maxHealth")?),
                "attrition" => {
                    fields.attrition = Some(self.non_negative_f32(field, "attrition")?)
                }
                "speed" => fields.speed = Some(self.non_negative_f32(field, "speed")?),
                "coinInterval" => {
                    fields.coin_interval = Some(self.positive_f32(field, "coinInterval")?)
                }
                "coinDrops" => fields.coin_drops = Some(self.coin_drops(field)?),
                "preferredPrey" => {
                    fields.preferred_prey = Some(self.category(field, "preferredPrey")?)
                }
                "fallRate" => fields.fall_rate = Some(self.non_negative_f32(field, "fallRate")?),
                "healAmount" => {
                    fields.heal_amount = Some(self.non_negative_f32(field, "healAmount")?)
                }
                "coinValue" => fields.coin_value = Some(self.non_negative_i64(field, "coinValue")?),
                _ => {
                    return Err(self.error_at(
                        ContentErrorCode::UnknownField,
                        format!("unknown field <{}> in <EntityDef>", field_name),
                        field,
                    ))
                }
            }
        }

        let def_name = self.require(fields.def_name, "defName", node)?;
        let label = self.require(fields.label, "label", node)?;
        let sprite = self.require(fields.sprite, "sprite", node)?;
        let category = self.require(fields.category, "category", node)?;

        let allowed = category_fields(category);
        for field in node.children().filter(|child| child.is_element()) {
            let name = field.tag_name().name();
            if !COMMON_FIELDS.contains(&name) && !allowed.contains(&name) {
                return Err(self.error_at(
                    ContentErrorCode::CategoryMismatch,
                    format!("field <{}> is not valid for category {}", name, category),
                    field,
                ));
            }
        }

        let tuning = match category {
            EntityCategory::Agent => ArchetypeTuning::Agent(AgentTuning {
                max_health: self.require(fields.max_health, "maxHealth", node)?,
                attrition_per_second: self.require(fields.attrition, "attrition", node)?,
                speed: self.require(fields.speed, "speed", node)?,
                coin_interval_seconds: self.require(fields.coin_interval, "coinInterval", node)?,
                coin_drops: self.require(fields.coin_drops, "coinDrops", node)?,
                preferred_prey: self.require(fields.preferred_prey, "preferredPrey", node)?,
            }),
            EntityCategory::Chum | EntityCategory::Poop => ArchetypeTuning::Drop(DropTuning {
                fall_rate: self.require(fields.fall_rate, "fallRate", node)?,
                heal_amount: self.require(fields.heal_amount, "healAmount", node)?,
                coin_value: 0,
            }),
            EntityCategory::Coin => ArchetypeTuning::Drop(DropTuning {
                fall_rate: self.require(fields.fall_rate, "fallRate", node)?,
                heal_amount: 0.0,
                coin_value: self.require(fields.coin_value, "coinValue", node)?,
            }),
        };

        Ok(PendingEntityDef {
            def_name,
            label,
            sprite,
            category,
            cost: fields.cost,
            tuning,
            mod_id: self.mod_id.to_string(),
            file_path: self.file_path.to_path_buf(),
            location: Some(self.location_of(node)),
        })
    }

    fn coin_drops(&self, node: Node<'_, '_>) -> Result<Vec<CoinDrop>, ContentCompileError> {
        let mut drops = Vec::new();
        for item in node.children().filter(|child| child.is_element()) {
            if item.tag_name().name() != "li" {
                return Err(self.error_at(
                    ContentErrorCode::UnknownField,
                    format!(
                        "unexpected <{}> in <coinDrops>; entries must be <li>",
                        item.tag_name().name()
                    ),
                    item,
                ));
            }
            let def_name = self.required_text(item, "coinDrops/li")?;
            let weight = match item.attribute("weight") {
                Some(raw) => raw
                    .trim()
                    .parse::<u32>()
                    .ok()
                    .filter(|weight| *weight > 0)
                    .ok_or_else(|| {
                        self.error_at(
                            ContentErrorCode::InvalidValue,
                            format!("coin drop weight '{}' must be a positive integer", raw),
                            item,
                        )
                    })?,
                None => 1,
            };
            drops.push(CoinDrop { def_name, weight });
        }
        if drops.is_empty() {
            return Err(self.error_at(
                ContentErrorCode::MissingField,
                "<coinDrops> must list at least one <li>".to_string(),
                node,
            ));
        }
        Ok(drops)
    }

    fn category(
        &self,
        node: Node<'_, '_>,
        field_name: &str,
    ) -> Result<EntityCategory, ContentCompileError> {
        let value = self.required_text(node, field_name)?;
        EntityCategory::parse(&value).ok_or_else(|| {
            self.error_at(
                ContentErrorCode::InvalidValue,
                format!(
                    "invalid {} '{}'; allowed values: Agent, Chum, Poop, Coin",
                    field_name, value
                ),
                node,
            )
        })
    }

    fn positive_f32(&self, node: Node<'_, '_>, field_name: &str) -> Result<f32, ContentCompileError> {
        let value = self.number::<f32>(node, field_name)?;
        if !value.is_finite() || value <= 0.0 {
            return Err(self.error_at(
                ContentErrorCode::InvalidValue,
                format!("{} must be finite and > 0", field_name),
                node,
            ));
        }
        Ok(value)
    }

    fn non_negative_f32(
        &self,
        node: Node<'_, '_>,
        field_name: &str,
    ) -> Result<f32, ContentCompileError> {
        let value = self.number::<f32>(node, field_name)?;
        if !value.is_finite() || value < 0.0 {
            return Err(self.error_at(
                ContentErrorCode::InvalidValue,
                format!("{} must be finite and >= 0", field_name),
                node,
            ));
        }
        Ok(value)
    }

    fn non_negative_i64(
        &self,
        node: Node<'_, '_>,
        field_name: &str,
    ) -> Result<i64, ContentCompileError> {
        let value = self.number::<i64>(node, field_name)?;
        if value < 0 {
            return Err(self.error_at(
                ContentErrorCode::InvalidValue,
                format!("{} must be >= 0", field_name),
                node,
            ));
        }
        Ok(value)
    }

    fn number<T: FromStr>(
        &self,
        node: Node<'_, '_>,
        field_name: &str,
    ) -> Result<T, ContentCompileError> {
        let value = self.required_text(node, field_name)?;
        value.parse::<T>().map_err(|_| {
            self.error_at(
                ContentErrorCode::InvalidValue,
                format!("{} '{}' is not a valid number", field_name, value),
                node,
            )
        })
    }

    fn require<T>(
        &self,
        value: Option<T>,
        field_name: &str,
        def_node: Node<'_, '_>,
    ) -> Result<T, ContentCompileError> {
        value.ok_or_else(|| {
            self.error_at(
                ContentErrorCode::MissingField,
                format!("missing required field <{}> in <EntityDef>", field_name),
                def_node,
            )
        })
    }

    fn required_text(
        &self,
        node: Node<'_, '_>,
        field_name: &str,
    ) -> Result<String, ContentCompileError> {
        let value = node.text().map(str::trim).unwrap_or_default().to_string();
        if value.is_empty() {
            return Err(self.error_at(
                ContentErrorCode::MissingField,
                format!("field <{}> must not be empty", field_name),
                node,
            ));
        }
        Ok(value)
    }

    fn location_of(&self, node: Node<'_, '_>) -> SourceLocation {
        let pos = self.doc.text_pos_at(node.range().start);
        SourceLocation {
            line: pos.row as usize,
            column: pos.col as usize,
        }
    }

    fn error_at(
        &self,
        code: ContentErrorCode,
        message: String,
        node: Node<'_, '_>,
    ) -> ContentCompileError {
        ContentCompileError {
            code,
            message,
            mod_id: self.mod_id.to_string(),
            file_path: self.file_path.to_path_buf(),
            location: Some(self.location_of(node)),
        }
    }
}

struct ReadError {
    path: PathBuf,
    source: std::io::Error,
}

fn collect_xml_files_sorted(root: &Path) -> Result<Vec<PathBuf>, ReadError> {
    let mut files = Vec::<PathBuf>::new();
    collect_recursive(root, &mut files)?;
    files.sort_by_key(|path| normalize_rel_path(path.strip_prefix(root).unwrap_or(path)));
    Ok(files)
}

fn collect_recursive(current: &Path, files: &mut Vec<PathBuf>) -> Result<(), ReadError> {
    let entries = fs::read_dir(current).map_err(|source| ReadError {
        path: current.to_path_buf(),
        source,
    })?;
    for entry in entries {
        let entry = entry.map_err(|source| ReadError {
            path: current.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if path.is_dir() {
            collect_recursive(&path, files)?;
        } else if path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"))
        {
            files.push(path);
        }
    }
    Ok(())
}

fn normalize_rel_path(path: &Path) -> String {
    path.components()
        .map(|component| component.as_os_str().to_string_lossy().to_string())
        .collect::<Vec<_>>()
        .join("/")
}

fn read_error(mod_id: &str, path: PathBuf, source: std::io::Error) -> ContentCompileError {
    ContentCompileError {
        code: ContentErrorCode::ReadFile,
        message: format!("failed to read XML file: {source}"),
        mod_id: mod_id.to_string(),
        file_path: path,
        location: None,
    }
}

fn map_discovery_error(error: ContentPlanError, root: &Path) -> ContentCompileError {
    match error {
        ContentPlanError::EnabledModMissing {
            mod_id,
            expected_dir,
        } => ContentCompileError {
            code: ContentErrorCode::Discovery,
            message: format!(
                "enabled mod '{}' not found at {}; check enabled mod list",
                mod_id,
                expected_dir.display()
            ),
            mod_id,
            file_path: expected_dir,
            location: None,
        },
        other => ContentCompileError {
            code: ContentErrorCode::Discovery,
            message: other.to_string(),
            mod_id: "<discovery>".to_string(),
            file_path: root.to_path_buf(),
            location: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    const SILVER_COIN: &str = r#"<EntityDef><defName>coin.silver</defName><label>Silver</label><sprite>coin_silver</sprite><category>Coin</category><fallRate>30</fallRate><coinValue>25</coinValue></EntityDef>"#;
    const GOLD_COIN: &str = r#"<EntityDef><defName>coin.gold</defName><label>Gold</label><sprite>coin_gold</sprite><category>Coin</category><fallRate>20</fallRate><coinValue>50</coinValue></EntityDef>"#;

    fn setup_app_paths(root: &Path) -> AppPaths {
        let app_paths = AppPaths::from_root(root.to_path_buf());
        fs::create_dir_all(&app_paths.base_content_dir).expect("base");
        fs::create_dir_all(&app_paths.mods_dir).expect("mods");
        app_paths
    }

    fn write_file(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("mkdir");
        }
        fs::write(path, content).expect("write");
    }

    fn fish(def_name: &str, extra: &str) -> String {
        format!(
            r#"<EntityDef><defName>{def_name}</defName><label>Fish</label><sprite>fish_cod</sprite><category>Agent</category><cost>150</cost><maxHealth>90</maxHealth><attrition>3</attrition><speed>45</speed><coinInterval>8</coinInterval><coinDrops><li>coin.silver</li></coinDrops><preferredPrey>Chum</preferredPrey>{extra}</EntityDef>"#
        )
    }

    fn compile_str(body: &str) -> Result<DefDatabase, ContentCompileError> {
        compile_def_database_from_str("base", Path::new("defs.xml"), &format!("<Defs>{body}</Defs>"))
    }

    #[test]
    fn valid_compile_assigns_stable_ids_by_def_name() {
        let temp = TempDir::new().expect("temp");
        let app = setup_app_paths(temp.path());
        write_file(
            &app.base_content_dir.join("defs.xml"),
            &format!("<Defs>{GOLD_COIN}{SILVER_COIN}</Defs>"),
        );
        let db = compile_def_database(&app, &ContentPlanRequest::default()).expect("compile");
        let gold = db.entity_def_id_by_name("coin.gold").expect("gold");
        let silver = db.entity_def_id_by_name("coin.silver").expect("silver");
        assert!(gold.0 < silver.0);
    }

    #[test]
    fn agent_def_carries_tuning_and_weighted_drops() {
        let body = format!(
            r#"{SILVER_COIN}{GOLD_COIN}<EntityDef><defName>fish.bass</defName><label>Bass</label><sprite>fish_bass</sprite><category>Agent</category><cost>350</cost><maxHealth>480</maxHealth><attrition>4</attrition><speed>60</speed><coinInterval>12</coinInterval><coinDrops><li weight="3">coin.silver</li><li>coin.gold</li></coinDrops><preferredPrey>Chum</preferredPrey></EntityDef>"#
        );
        let db = compile_str(&body).expect("compile");
        let bass = db.entity_def_by_name("fish.bass").expect("bass");
        assert_eq!(bass.category, EntityCategory::Agent);
        assert_eq!(bass.cost, Some(350));
        let tuning = bass.agent_tuning().expect("agent tuning");
        assert!((tuning.max_health - 480.0).abs() < f32::EPSILON);
        assert!((tuning.attrition_per_second - 4.0).abs() < f32::EPSILON);
        assert_eq!(tuning.preferred_prey, EntityCategory::Chum);
        assert_eq!(
            tuning.coin_drops,
            vec![
                CoinDrop {
                    def_name: "coin.silver".to_string(),
                    weight: 3
                },
                CoinDrop {
                    def_name: "coin.gold".to_string(),
                    weight: 1
                },
            ]
        );

        let silver = db.entity_def_by_name("coin.silver").expect("silver");
        let drop = silver.drop_tuning().expect("drop tuning");
        assert_eq!(drop.coin_value, 25);
        assert_eq!(silver.cost, None);
    }

    #[test]
    fn missing_def_name_reports_mod_file_and_location() {
        let temp = TempDir::new().expect("temp");
        let app = setup_app_paths(temp.path());
        write_file(
            &app.base_content_dir.join("defs.xml"),
            r#"<Defs><EntityDef><label>X</label><sprite>poop</sprite><category>Poop</category></EntityDef></Defs>"#,
        );
        let err = compile_def_database(&app, &ContentPlanRequest::default()).expect_err("err");
        assert_eq!(err.code, ContentErrorCode::MissingField);
        assert_eq!(err.mod_id, "base");
        assert!(err
            .file_path
            .ends_with(Path::new("assets").join("base").join("defs.xml")));
        assert!(err.location.is_some());
    }

    #[test]
    fn unknown_field_errors() {
        let err = compile_str(&fish("fish.cod", "<mood>Happy</mood>")).expect_err("err");
        assert_eq!(err.code, ContentErrorCode::UnknownField);
    }

    #[test]
    fn duplicate_field_errors() {
        let err = compile_str(&fish("fish.cod", "<speed>2</speed>")).expect_err("err");
        assert_eq!(err.code, ContentErrorCode::DuplicateField);
    }

    #[test]
    fn field_from_other_category_errors() {
        let body = format!("{SILVER_COIN}{}", fish("fish.cod", "<fallRate>3</fallRate>"));
        let err = compile_str(&body).expect_err("err");
        assert_eq!(err.code, ContentErrorCode::CategoryMismatch);
        assert!(err.message.contains("fallRate"));
    }

    #[test]
    fn missing_category_specific_field_errors() {
        let err = compile_str(
            r#"<EntityDef><defName>chum.small</defName><label>Pellet</label><sprite>pellet_small</sprite><category>Chum</category><fallRate>30</fallRate></EntityDef>"#,
        )
        .expect_err("err");
        assert_eq!(err.code, ContentErrorCode::MissingField);
        assert!(err.message.contains("healAmount"));
    }

    #[test]
    fn invalid_category_and_numbers_error() {
        let err = compile_str(
            r#"<EntityDef><defName>a</defName><label>A</label><sprite>a</sprite><category>Fish</category></EntityDef>"#,
        )
        .expect_err("err");
        assert_eq!(err.code, ContentErrorCode::InvalidValue);

        let err = compile_str(&fish("fish.cod", "").replace("<maxHealth>90", "<maxHealth>0"))
            .expect_err("err");
        assert_eq!(err.code, ContentErrorCode::InvalidValue);

        let err = compile_str(&fish("fish.cod", "").replace("<cost>150", "<cost>-1"))
            .expect_err("err");
        assert_eq!(err.code, ContentErrorCode::InvalidValue);
    }

    #[test]
    fn invalid_sprite_key_errors() {
        let err = compile_str(&fish("fish.cod", "").replace("fish_cod", "Fish Cod"))
            .expect_err("err");
        assert_eq!(err.code, ContentErrorCode::InvalidValue);
    }

    #[test]
    fn zero_weight_coin_drop_errors() {
        let body = format!(
            "{SILVER_COIN}{}",
            fish("fish.cod", "").replace("<li>", r#"<li weight="0">"#)
        );
        let err = compile_str(&body).expect_err("err");
        assert_eq!(err.code, ContentErrorCode::InvalidValue);
    }

    #[test]
    fn unknown_coin_drop_reference_errors() {
        let err = compile_str(&fish("fish.cod", "")).expect_err("err");
        assert_eq!(err.code, ContentErrorCode::UnresolvedReference);
        assert!(err.message.contains("coin.silver"));
    }

    #[test]
    fn coin_drop_must_reference_a_coin() {
        let body = fish("fish.cod", "").replace("<li>coin.silver</li>", "<li>fish.cod</li>");
        let err = compile_str(&body).expect_err("err");
        assert_eq!(err.code, ContentErrorCode::CategoryMismatch);
    }

    #[test]
    fn malformed_xml_reports_location() {
        let err = compile_def_database_from_str(
            "base",
            Path::new("defs.xml"),
            r#"<Defs><EntityDef><defName>a</defName></Defs>"#,
        )
        .expect_err("err");
        assert_eq!(err.code, ContentErrorCode::XmlMalformed);
        assert!(err.location.is_some());
    }

    #[test]
    fn wrong_root_and_def_type_error() {
        let err = compile_def_database_from_str("base", Path::new("defs.xml"), "<Things/>")
            .expect_err("err");
        assert_eq!(err.code, ContentErrorCode::InvalidRoot);

        let err = compile_str("<ThingDef/>").expect_err("err");
        assert_eq!(err.code, ContentErrorCode::UnknownDefType);
    }

    #[test]
    fn same_mod_duplicate_def_errors() {
        let err = compile_str(&format!("{SILVER_COIN}{SILVER_COIN}")).expect_err("err");
        assert_eq!(err.code, ContentErrorCode::DuplicateDefInMod);
    }

    #[test]
    fn cross_mod_duplicate_is_last_mod_wins() {
        let temp = TempDir::new().expect("temp");
        let app = setup_app_paths(temp.path());
        fs::create_dir_all(app.mods_dir.join("moda")).expect("mkdir");
        write_file(
            &app.base_content_dir.join("defs.xml"),
            &format!("<Defs>{SILVER_COIN}</Defs>"),
        );
        write_file(
            &app.mods_dir.join("moda").join("defs.xml"),
            &format!("<Defs>{}</Defs>", SILVER_COIN.replace(">25<", ">40<")),
        );
        let db = compile_def_database(
            &app,
            &ContentPlanRequest {
                enabled_mods: vec!["moda".to_string()],
            },
        )
        .expect("compile");
        let def = db.entity_def_by_name("coin.silver").expect("def");
        assert_eq!(def.drop_tuning().map(|drop| drop.coin_value), Some(40));
    }

    #[test]
    fn missing_enabled_mod_is_a_discovery_error() {
        let temp = TempDir::new().expect("temp");
        let app = setup_app_paths(temp.path());
        let err = compile_def_database(
            &app,
            &ContentPlanRequest {
                enabled_mods: vec!["ghost".to_string()],
            },
        )
        .expect_err("err");
        assert_eq!(err.code, ContentErrorCode::Discovery);
        assert_eq!(err.mod_id, "ghost");
    }

    #[test]
    fn shipped_catalog_compiles() {
        let raw = include_str!("../../../../assets/base/catalog.xml");
        let db = compile_def_database_from_str("base", Path::new("catalog.xml"), raw)
            .expect("shipped catalog");
        for name in [
            "fish.cod",
            "fish.bass",
            "fish.janitor",
            "fish.carnivore",
            "chum.small",
            "chum.large",
            "drop.poop",
            "coin.silver",
            "coin.gold",
        ] {
            assert!(db.entity_def_by_name(name).is_some(), "missing {name}");
        }
        assert_eq!(db.cheapest_cost(EntityCategory::Agent), Some(150));
    }
}
