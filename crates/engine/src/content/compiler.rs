use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use roxmltree::{Document, Node};

use crate::asset_refs::validate_asset_ref;
use crate::map::{Building, Footprint, LocationId, MapConfig, TownMap, Vec2};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentErrorCode {
    ReadFile,
    XmlMalformed,
    InvalidRoot,
    UnknownElement,
    UnknownField,
    DuplicateField,
    MissingField,
    InvalidValue,
    DuplicateBuildingId,
    MissingMapConfig,
}

#[derive(Debug, Clone)]
pub struct ContentCompileError {
    pub code: ContentErrorCode,
    pub message: String,
    pub file_path: PathBuf,
    pub location: Option<SourceLocation>,
}

impl fmt::Display for ContentCompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location {
            Some(loc) => write!(
                f,
                "{:?}: {} (file={}, line={}, column={})",
                self.code,
                self.message,
                self.file_path.display(),
                loc.line,
                loc.column
            ),
            None => write!(
                f,
                "{:?}: {} (file={})",
                self.code,
                self.message,
                self.file_path.display()
            ),
        }
    }
}

impl std::error::Error for ContentCompileError {}

const MAP_CONFIG_FIELDS: &[&str] = &[
    "width",
    "height",
    "spawnX",
    "spawnY",
    "playerSpeed",
    "interactionRadius",
    "walkMargin",
];

const BUILDING_FIELDS: &[&str] = &[
    "id",
    "name",
    "location",
    "x",
    "y",
    "width",
    "height",
    "unlockLevel",
    "asset",
    "description",
];

pub fn load_town_map_from_path(path: &Path) -> Result<TownMap, ContentCompileError> {
    let raw = fs::read_to_string(path).map_err(|source| ContentCompileError {
        code: ContentErrorCode::ReadFile,
        message: format!("failed to read town XML: {source}"),
        file_path: path.to_path_buf(),
        location: None,
    })?;
    compile_town_xml(path, &raw)
}

/// Compiles a `<Town>` document: exactly one `<MapConfig>` plus any number of
/// `<BuildingDef>`s, kept in document order.
pub fn compile_town_xml(file_path: &Path, raw: &str) -> Result<TownMap, ContentCompileError> {
    let doc = Document::parse(raw).map_err(|error| ContentCompileError {
        code: ContentErrorCode::XmlMalformed,
        message: format!("malformed XML: {error}"),
        file_path: file_path.to_path_buf(),
        location: Some(SourceLocation {
            line: error.pos().row as usize,
            column: error.pos().col as usize,
        }),
    })?;
    let source = Source {
        file_path,
        doc: &doc,
    };

    let root = doc.root_element();
    if root.tag_name().name() != "Town" {
        return Err(source.error_at_node(
            ContentErrorCode::InvalidRoot,
            format!("root element must be <Town>, found <{}>", root.tag_name().name()),
            root,
        ));
    }

    let mut config: Option<MapConfig> = None;
    let mut buildings = Vec::<Building>::new();
    let mut seen_ids = HashSet::<String>::new();
    for child in root.children().filter(|node| node.is_element()) {
        match child.tag_name().name() {
            "MapConfig" => {
                if config.is_some() {
                    return Err(source.error_at_node(
                        ContentErrorCode::DuplicateField,
                        "duplicate <MapConfig>; a town has exactly one".to_string(),
                        child,
                    ));
                }
                config = Some(parse_map_config(&source, child)?);
            }
            "BuildingDef" => {
                let building = parse_building(&source, child)?;
                if !seen_ids.insert(building.id.clone()) {
                    return Err(source.error_at_node(
                        ContentErrorCode::DuplicateBuildingId,
                        format!("duplicate building id '{}'", building.id),
                        child,
                    ));
                }
                buildings.push(building);
            }
            other => {
                return Err(source.error_at_node(
                    ContentErrorCode::UnknownElement,
                    format!("unsupported element <{other}>; expected <MapConfig> or <BuildingDef>"),
                    child,
                ))
            }
        }
    }

    let Some(config) = config else {
        return Err(source.error_at_node(
            ContentErrorCode::MissingMapConfig,
            "missing required <MapConfig> in <Town>".to_string(),
            root,
        ));
    };
    Ok(TownMap::new(config, buildings))
}

fn parse_map_config(source: &Source<'_, '_>, node: Node<'_, '_>) -> Result<MapConfig, ContentCompileError> {
    let fields = Fields::collect(source, node, "MapConfig", MAP_CONFIG_FIELDS)?;
    let defaults = MapConfig::default();

    let width = fields.required_f32(source, "width")?;
    let height = fields.required_f32(source, "height")?;
    fields.ensure(source, "width", width > 0.0, "width must be > 0")?;
    fields.ensure(source, "height", height > 0.0, "height must be > 0")?;

    let spawn_x = fields.optional_f32(source, "spawnX")?.unwrap_or(width * 0.5);
    let spawn_y = fields.optional_f32(source, "spawnY")?.unwrap_or(height * 0.5);
    let player_speed = fields
        .optional_f32(source, "playerSpeed")?
        .unwrap_or(defaults.player_speed);
    fields.ensure(source, "playerSpeed", player_speed > 0.0, "playerSpeed must be > 0")?;
    let interaction_radius = fields
        .optional_f32(source, "interactionRadius")?
        .unwrap_or(defaults.interaction_radius);
    fields.ensure(
        source,
        "interactionRadius",
        interaction_radius > 0.0,
        "interactionRadius must be > 0",
    )?;
    let walk_margin = fields
        .optional_f32(source, "walkMargin")?
        .unwrap_or(defaults.walk_margin);
    fields.ensure(source, "walkMargin", walk_margin >= 0.0, "walkMargin must be >= 0")?;

    Ok(MapConfig {
        width,
        height,
        spawn: Vec2::new(spawn_x, spawn_y),
        player_speed,
        interaction_radius,
        walk_margin,
    })
}

fn parse_building(source: &Source<'_, '_>, node: Node<'_, '_>) -> Result<Building, ContentCompileError> {
    let fields = Fields::collect(source, node, "BuildingDef", BUILDING_FIELDS)?;

    let id = fields.required_text(source, "id")?;
    let name = fields.required_text(source, "name")?;
    let location = fields.required_text(source, "location")?;
    let x = fields.required_f32(source, "x")?;
    let y = fields.required_f32(source, "y")?;
    let width = fields.required_f32(source, "width")?;
    let height = fields.required_f32(source, "height")?;
    fields.ensure(source, "width", width > 0.0, "width must be > 0")?;
    fields.ensure(source, "height", height > 0.0, "height must be > 0")?;

    let unlock_level = match fields.optional_text(source, "unlockLevel")? {
        Some(value) => value.parse::<u32>().map_err(|_| {
            fields.invalid(
                source,
                "unlockLevel",
                format!("unlockLevel '{value}' is not a non-negative integer"),
            )
        })?,
        None => 1,
    };

    let asset = fields
        .optional_text(source, "asset")?
        .unwrap_or_else(|| format!("buildings/{id}"));
    if let Err(error) = validate_asset_ref(&asset) {
        return Err(fields.invalid(source, "asset", format!("invalid asset ref '{asset}': {error}")));
    }
    let description = fields.optional_text(source, "description")?.unwrap_or_default();

    Ok(Building {
        id,
        name,
        location: LocationId::new(location),
        center: Vec2::new(x, y),
        footprint: Footprint { width, height },
        unlock_level,
        asset,
        description,
    })
}

struct Source<'a, 'input> {
    file_path: &'a Path,
    doc: &'a Document<'input>,
}

impl Source<'_, '_> {
    fn error_at_node(
        &self,
        code: ContentErrorCode,
        message: String,
        node: Node<'_, '_>,
    ) -> ContentCompileError {
        let pos = self.doc.text_pos_at(node.range().start);
        ContentCompileError {
            code,
            message,
            file_path: self.file_path.to_path_buf(),
            location: Some(SourceLocation {
                line: pos.row as usize,
                column: pos.col as usize,
            }),
        }
    }
}

/// Child elements of one def, keyed by tag name.
struct Fields<'a, 'input> {
    element: &'static str,
    parent: Node<'a, 'input>,
    nodes: BTreeMap<String, Node<'a, 'input>>,
}

impl<'a, 'input> Fields<'a, 'input> {
    fn collect(
        source: &Source<'_, '_>,
        parent: Node<'a, 'input>,
        element: &'static str,
        allowed: &[&str],
    ) -> Result<Self, ContentCompileError> {
        let mut nodes = BTreeMap::new();
        for field in parent.children().filter(|child| child.is_element()) {
            let field_name = field.tag_name().name();
            if !allowed.iter().any(|known| *known == field_name) {
                return Err(source.error_at_node(
                    ContentErrorCode::UnknownField,
                    format!("unknown field <{field_name}> in <{element}>"),
                    field,
                ));
            }
            if nodes.insert(field_name.to_string(), field).is_some() {
                return Err(source.error_at_node(
                    ContentErrorCode::DuplicateField,
                    format!("duplicate field <{field_name}> in <{element}>"),
                    field,
                ));
            }
        }
        Ok(Self {
            element,
            parent,
            nodes,
        })
    }

    fn optional_text(
        &self,
        source: &Source<'_, '_>,
        name: &str,
    ) -> Result<Option<String>, ContentCompileError> {
        let Some(node) = self.nodes.get(name) else {
            return Ok(None);
        };
        let value = node.text().map(str::trim).unwrap_or_default().to_string();
        if value.is_empty() {
            return Err(source.error_at_node(
                ContentErrorCode::MissingField,
                format!("field <{name}> must not be empty"),
                *node,
            ));
        }
        Ok(Some(value))
    }

    fn required_text(&self, source: &Source<'_, '_>, name: &str) -> Result<String, ContentCompileError> {
        self.optional_text(source, name)?.ok_or_else(|| {
            source.error_at_node(
                ContentErrorCode::MissingField,
                format!("missing required field <{name}> in <{}>", self.element),
                self.parent,
            )
        })
    }

    fn optional_f32(&self, source: &Source<'_, '_>, name: &str) -> Result<Option<f32>, ContentCompileError> {
        let Some(value) = self.optional_text(source, name)? else {
            return Ok(None);
        };
        match value.parse::<f32>() {
            Ok(parsed) if parsed.is_finite() => Ok(Some(parsed)),
            _ => Err(self.invalid(source, name, format!("{name} '{value}' is not a finite number"))),
        }
    }

    fn required_f32(&self, source: &Source<'_, '_>, name: &str) -> Result<f32, ContentCompileError> {
        self.optional_f32(source, name)?.ok_or_else(|| {
            source.error_at_node(
                ContentErrorCode::MissingField,
                format!("missing required field <{name}> in <{}>", self.element),
                self.parent,
            )
        })
    }

    fn ensure(
        &self,
        source: &Source<'_, '_>,
        name: &str,
        holds: bool,
        message: &str,
    ) -> Result<(), ContentCompileError> {
        if holds {
            Ok(())
        } else {
            Err(self.invalid(source, name, message.to_string()))
        }
    }

    fn invalid(&self, source: &Source<'_, '_>, name: &str, message: String) -> ContentCompileError {
        let node = self.nodes.get(name).copied().unwrap_or(self.parent);
        source.error_at_node(ContentErrorCode::InvalidValue, message, node)
    }
}
