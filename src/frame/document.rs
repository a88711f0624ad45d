use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::foundation::core::Rgba8;
use crate::foundation::error::{TesseraError, TesseraResult};
use crate::frame::FrameMetadata;
use crate::render_pass::RenderPassList;
use crate::resources::{Bitmap, Resource, ResourceId, ResourceTable, WrapMode};

/// Where a document resource gets its pixels.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResourceSource {
    /// Encoded image file, relative to the document's directory.
    Image {
        /// File path.
        path: PathBuf,
    },
    /// Uniform fill.
    Solid {
        /// Width in pixels.
        width: u32,
        /// Height in pixels.
        height: u32,
        /// Fill color.
        color: Rgba8,
    },
}

/// One resource declared by a document under a document-local id.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ResourceDef {
    /// Id used by the document's quads.
    pub id: ResourceId,
    /// Pixel source.
    pub source: ResourceSource,
    /// Sampling outside the bitmap.
    #[serde(default)]
    pub wrap_mode: WrapMode,
}

/// JSON description of one frame: resources plus passes, root last.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct FrameDocument {
    /// Frame metadata.
    #[serde(default)]
    pub metadata: FrameMetadata,
    /// Resources the passes read.
    #[serde(default)]
    pub resources: Vec<ResourceDef>,
    /// Passes in draw order.
    pub passes: RenderPassList,
}

impl FrameDocument {
    /// Parse and validate a document from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> TesseraResult<Self> {
        let doc: FrameDocument = serde_json::from_reader(r)
            .map_err(|e| TesseraError::serde(format!("parse frame document JSON: {e}")))?;
        doc.validate()?;
        Ok(doc)
    }

    /// Parse and validate a document from a JSON string.
    pub fn from_json(json: &str) -> TesseraResult<Self> {
        Self::from_reader(json.as_bytes())
    }

    /// Parse and validate a document from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> TesseraResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            TesseraError::validation(format!("open frame document '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Pass invariants, unique resource ids, and every referenced resource declared.
    pub fn validate(&self) -> TesseraResult<()> {
        self.passes.validate()?;
        let mut declared = HashSet::with_capacity(self.resources.len());
        for def in &self.resources {
            if !declared.insert(def.id) {
                return Err(TesseraError::validation(format!(
                    "resource {} declared twice",
                    def.id
                )));
            }
        }
        if let Some(missing) = self
            .passes
            .resource_ids()
            .into_iter()
            .find(|id| !declared.contains(id))
        {
            return Err(TesseraError::validation(format!(
                "quads reference undeclared resource {missing}"
            )));
        }
        Ok(())
    }

    /// Load every resource into `table` (image paths resolve against `base_dir`) and
    /// return the metadata and passes, rewritten to the ids the table minted.
    pub fn into_frame(
        self,
        table: &mut ResourceTable,
        base_dir: &Path,
    ) -> TesseraResult<(FrameMetadata, RenderPassList)> {
        let mut minted: HashMap<ResourceId, ResourceId> = HashMap::with_capacity(self.resources.len());
        for def in &self.resources {
            let bitmap = load_source(&def.source, base_dir)?;
            let id = table.register(Resource::bitmap(bitmap).with_wrap_mode(def.wrap_mode));
            minted.insert(def.id, id);
        }

        let mut passes = self.passes;
        passes.remap_resources(|id| minted.get(&id).copied().unwrap_or(id));
        Ok((self.metadata, passes))
    }
}

fn load_source(source: &ResourceSource, base_dir: &Path) -> TesseraResult<Bitmap> {
    match source {
        ResourceSource::Image { path } => {
            let full = if path.is_absolute() {
                path.clone()
            } else {
                base_dir.join(path)
            };
            let bytes = std::fs::read(&full).map_err(|e| {
                TesseraError::resource(format!("read image '{}': {e}", full.display()))
            })?;
            Bitmap::decode(&bytes)
        }
        ResourceSource::Solid {
            width,
            height,
            color,
        } => Bitmap::solid(*width, *height, *color),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/frame/document.rs"]
mod tests;
