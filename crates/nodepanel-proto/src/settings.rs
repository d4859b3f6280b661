//! Read-only view of the node's `.txt` configuration blocks.
//!
//! `GET /json/directory` lists the blocks the node knows about and
//! `GET /json/<name>.txt` returns one of them as a flat JSON object. Nothing
//! here writes configuration back.

use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::NodeError;
use crate::protocol::CONFIG_DIRECTORY;
use crate::table::{DisplayTable, PanelId, RenderTarget};
use crate::transport::{get_json, Transport};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFileEntry {
    pub name: String,
    pub description: String,
}

/// Body of `directory`. The node sends `{"files":{"rconfig.txt":"Remote
/// configuration", …}}`; a bare name array is accepted too. Object entries
/// come out sorted by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigDirectory {
    pub files: Vec<ConfigFileEntry>,
}

impl<'de> Deserialize<'de> for ConfigDirectory {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let files = match Value::deserialize(d)? {
            Value::Object(mut map) if map.contains_key("files") => {
                map.remove("files").unwrap_or(Value::Null)
            }
            other => other,
        };
        let files = match files {
            Value::Null => Vec::new(),
            Value::Object(map) => map
                .into_iter()
                .map(|(name, desc)| ConfigFileEntry {
                    name,
                    description: cell_text(&desc),
                })
                .collect(),
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::String(name) => Ok(ConfigFileEntry {
                        name,
                        description: String::new(),
                    }),
                    other => Err(de::Error::custom(format!("bad config file entry {}", other))),
                })
                .collect::<Result<Vec<_>, D::Error>>()?,
            other => return Err(de::Error::custom(format!("bad config directory {}", other))),
        };
        Ok(Self { files })
    }
}

/// One configuration block as key/value pairs, sorted by key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigBlock {
    pub name: String,
    pub entries: Vec<(String, String)>,
}

impl ConfigBlock {
    /// Accepts the flat object and the `{"<name>": {…}}` wrapped form.
    pub fn from_value(name: &str, value: Value) -> Result<Self, NodeError> {
        let mut map: Map<String, Value> = match value {
            Value::Object(map) => map,
            other => {
                return Err(NodeError::Decode(de::Error::custom(format!(
                    "{} is not an object: {}",
                    name, other
                ))))
            }
        };
        if map.len() == 1 && map.get(name).map_or(false, Value::is_object) {
            if let Some(Value::Object(inner)) = map.remove(name) {
                map = inner;
            }
        }
        Ok(Self {
            name: name.to_string(),
            entries: map.iter().map(|(k, v)| (k.clone(), cell_text(v))).collect(),
        })
    }
}

fn cell_text(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// The node only serves `<name>.txt` from this namespace.
pub fn check_name(name: &str) -> Result<(), NodeError> {
    let stem = name.strip_suffix(".txt").unwrap_or("");
    if stem.is_empty() || stem.contains(['/', '?', '#']) {
        return Err(NodeError::InvalidConfigName(name.to_string()));
    }
    Ok(())
}

pub fn render_config_directory(directory: &ConfigDirectory) -> DisplayTable {
    let mut table = DisplayTable::new("Config files", &["File", "Description"]);
    for entry in &directory.files {
        table
            .rows
            .push(vec![entry.name.clone(), entry.description.clone()]);
    }
    table
}

pub fn render_config_block(block: &ConfigBlock) -> DisplayTable {
    let mut table = DisplayTable::new(block.name.clone(), &["Key", "Value"]);
    for (key, value) in &block.entries {
        table.rows.push(vec![key.clone(), value.clone()]);
    }
    table
}

pub async fn refresh_config_directory<X, R>(
    transport: &X,
    target: &mut R,
) -> Result<ConfigDirectory, NodeError>
where
    X: Transport,
    R: RenderTarget,
{
    let directory: ConfigDirectory = get_json(transport, CONFIG_DIRECTORY).await?;
    debug!("config directory: {} files", directory.files.len());
    target.present(PanelId::ConfigFiles, render_config_directory(&directory));
    Ok(directory)
}

/// Fetch and present one block. An invalid name fails before any request.
pub async fn refresh_config_file<X, R>(
    transport: &X,
    name: &str,
    target: &mut R,
) -> Result<ConfigBlock, NodeError>
where
    X: Transport,
    R: RenderTarget,
{
    check_name(name)?;
    let block = ConfigBlock::from_value(name, transport.get(name).await?)?;
    debug!("config {}: {} keys", name, block.entries.len());
    target.present(PanelId::ConfigFile, render_config_block(&block));
    Ok(block)
}
