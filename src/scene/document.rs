use crate::compile::compiler::{CompileOptions, CompiledScene, load};
use crate::foundation::error::{KeysplineError, KeysplineResult};
use crate::scene::model::SceneDef;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Scene boundary object.
///
/// This is the JSON-facing, human-edited representation of a scene: splines
/// of keyframed channels, shared variables, and publish declarations. It is
/// validated and compiled into an immutable [`CompiledScene`] by
/// [`Scene::compile`]; parsing alone performs no validation.
#[derive(Debug, Clone)]
pub struct Scene {
    def: SceneDef,
}

impl Scene {
    /// Parse a scene from a JSON string.
    pub fn from_str(s: &str) -> KeysplineResult<Self> {
        let def: SceneDef = serde_json::from_str(s)
            .map_err(|e| KeysplineError::serde(format!("parse scene JSON: {e}")))?;
        Ok(Self { def })
    }

    /// Parse a scene from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> KeysplineResult<Self> {
        let def: SceneDef = serde_json::from_reader(r)
            .map_err(|e| KeysplineError::serde(format!("parse scene JSON: {e}")))?;
        Ok(Self { def })
    }

    /// Parse a scene from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> KeysplineResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            KeysplineError::validation(format!("open scene JSON '{}': {e}", path.display()))
        })?;
        let r = BufReader::new(f);
        Self::from_reader(r)
    }

    /// Compile the scene with explicit options.
    pub fn compile(&self, opts: CompileOptions) -> KeysplineResult<CompiledScene> {
        load(&self.def, opts)
    }

    /// Declared scene name, if any.
    pub fn name(&self) -> Option<&str> {
        self.def.name.as_deref()
    }

    pub(crate) fn def(&self) -> &SceneDef {
        &self.def
    }
}
