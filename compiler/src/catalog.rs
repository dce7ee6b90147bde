// catalog.rs — Type and procedure catalogs
//
// Holds the types a graph may mention and, per procedure id, the definition
// (typed input slots, output flows with typed values) consumed by the graph
// context and the implementation template consumed by the generator.
// Catalogs are loaded from JSON manifests and validated on load, so code
// generation never meets a malformed template.

use std::fmt;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::codegen::flow_suffix;
use crate::graph::TypeId;
use crate::template::{Template, TemplateError};

// ── Data types ──────────────────────────────────────────────────────────────

/// A catalog type: identity plus its spelling in the host language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDef {
    pub id: TypeId,
    pub host: String,
}

/// A named, typed slot: a procedure input or a value carried by an output flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotDef {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeId,
}

impl SlotDef {
    pub fn new(name: impl Into<String>, ty: impl Into<String>) -> Self {
        SlotDef {
            name: name.into(),
            ty: TypeId::new(ty),
        }
    }
}

/// An output flow (outcome) of a procedure and the values it carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowDef {
    pub name: String,
    #[serde(default)]
    pub values: Vec<SlotDef>,
}

impl FlowDef {
    pub fn new(name: impl Into<String>, values: Vec<SlotDef>) -> Self {
        FlowDef {
            name: name.into(),
            values,
        }
    }

    pub fn value(&self, name: &str) -> Option<&SlotDef> {
        self.values.iter().find(|v| v.name == name)
    }
}

/// Signature of a catalog procedure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcDefinition {
    #[serde(default)]
    pub inputs: Vec<SlotDef>,
    #[serde(default)]
    pub outputs: Vec<FlowDef>,
}

impl ProcDefinition {
    pub fn input(&self, name: &str) -> Option<&SlotDef> {
        self.inputs.iter().find(|s| s.name == name)
    }

    pub fn flow(&self, name: &str) -> Option<&FlowDef> {
        self.outputs.iter().find(|f| f.name == name)
    }

    fn type_ids(&self) -> impl Iterator<Item = &TypeId> {
        self.inputs
            .iter()
            .map(|s| &s.ty)
            .chain(self.outputs.iter().flat_map(|f| f.values.iter().map(|v| &v.ty)))
    }
}

/// Code template of a catalog procedure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Implementation {
    pub template: Template,
}

// ── Lookup traits ───────────────────────────────────────────────────────────

/// Definitions and types, consumed by the graph context.
pub trait DefinitionCatalog {
    fn lookup_definition(&self, proc_id: &str) -> Option<&ProcDefinition>;
    fn lookup_type(&self, ty: &TypeId) -> Option<&TypeDef>;
}

/// Implementations and host-language type spellings, consumed by the generator.
pub trait ImplementationCatalog {
    fn lookup_implementation(&self, proc_id: &str) -> Option<&Implementation>;
    fn host_type(&self, ty: &TypeId) -> Option<&str>;
}

// ── Errors ──────────────────────────────────────────────────────────────────

/// Errors that can occur while loading catalog manifests.
#[derive(Debug)]
pub enum CatalogError {
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },
    JsonError {
        path: PathBuf,
        source: serde_json::Error,
    },
    TemplateError {
        path: PathBuf,
        procedure: String,
        errors: Vec<TemplateError>,
    },
    InvalidProcedure {
        path: PathBuf,
        procedure: String,
        message: String,
    },
    DuplicateProcedure {
        name: String,
        first: PathBuf,
        second: PathBuf,
    },
    DuplicateType {
        id: TypeId,
        first: PathBuf,
        second: PathBuf,
    },
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::IoError { path, source } => {
                write!(f, "{}: {}", path.display(), source)
            }
            CatalogError::JsonError { path, source } => {
                write!(f, "{}: invalid manifest: {}", path.display(), source)
            }
            CatalogError::TemplateError {
                path,
                procedure,
                errors,
            } => {
                write!(
                    f,
                    "{}: procedure '{}': invalid template",
                    path.display(),
                    procedure
                )?;
                for e in errors {
                    write!(f, "\n  {}", e)?;
                }
                Ok(())
            }
            CatalogError::InvalidProcedure {
                path,
                procedure,
                message,
            } => {
                write!(
                    f,
                    "{}: procedure '{}': {}",
                    path.display(),
                    procedure,
                    message
                )
            }
            CatalogError::DuplicateProcedure {
                name,
                first,
                second,
            } => {
                write!(
                    f,
                    "duplicate procedure '{}': first defined in {}, redefined in {}",
                    name,
                    first.display(),
                    second.display()
                )
            }
            CatalogError::DuplicateType { id, first, second } => {
                write!(
                    f,
                    "duplicate type '{}': first defined in {}, redefined in {}",
                    id,
                    first.display(),
                    second.display()
                )
            }
        }
    }
}

impl std::error::Error for CatalogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CatalogError::IoError { source, .. } => Some(source),
            CatalogError::JsonError { source, .. } => Some(source),
            _ => None,
        }
    }
}

// ── Manifest ────────────────────────────────────────────────────────────────

/// On-disk catalog format.
///
/// ```json
/// { "types": { "number": "number" },
///   "procedures": { "add": { "inputs": [...], "outputs": [...],
///                            "template": "@result({ res: $a + $b })" } } }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default)]
    pub types: IndexMap<TypeId, String>,
    #[serde(default)]
    pub procedures: IndexMap<String, ProcManifest>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcManifest {
    #[serde(flatten)]
    pub definition: ProcDefinition,
    pub template: String,
}

const BUILTIN_ORIGIN: &str = "<builtin>";

const BUILTIN_MANIFEST: &str = r#"{
  "types": { "number": "number", "string": "string", "boolean": "boolean" },
  "procedures": {
    "add": {
      "inputs": [{ "name": "a", "type": "number" }, { "name": "b", "type": "number" }],
      "outputs": [{ "name": "result", "values": [{ "name": "res", "type": "number" }] }],
      "template": "@result({ res: $a + $b })"
    },
    "sub": {
      "inputs": [{ "name": "a", "type": "number" }, { "name": "b", "type": "number" }],
      "outputs": [{ "name": "result", "values": [{ "name": "res", "type": "number" }] }],
      "template": "@result({ res: $a - $b })"
    },
    "mul": {
      "inputs": [{ "name": "a", "type": "number" }, { "name": "b", "type": "number" }],
      "outputs": [{ "name": "result", "values": [{ "name": "res", "type": "number" }] }],
      "template": "@result({ res: $a * $b })"
    },
    "div": {
      "inputs": [{ "name": "a", "type": "number" }, { "name": "b", "type": "number" }],
      "outputs": [
        { "name": "result", "values": [{ "name": "res", "type": "number" }] },
        { "name": "divByZero", "values": [] }
      ],
      "template": "$b === 0 ? @divByZero({}) : @result({ res: $a / $b })"
    },
    "negate": {
      "inputs": [{ "name": "x", "type": "number" }],
      "outputs": [{ "name": "result", "values": [{ "name": "res", "type": "number" }] }],
      "template": "@result({ res: -$x })"
    },
    "concat": {
      "inputs": [{ "name": "a", "type": "string" }, { "name": "b", "type": "string" }],
      "outputs": [{ "name": "result", "values": [{ "name": "res", "type": "string" }] }],
      "template": "@result({ res: $a + $b })"
    },
    "toString": {
      "inputs": [{ "name": "x", "type": "number" }],
      "outputs": [{ "name": "result", "values": [{ "name": "res", "type": "string" }] }],
      "template": "@result({ res: String($x) })"
    },
    "parseNumber": {
      "inputs": [{ "name": "s", "type": "string" }],
      "outputs": [
        { "name": "result", "values": [{ "name": "res", "type": "number" }] },
        { "name": "invalid", "values": [] }
      ],
      "template": "Number.isNaN(Number($s)) ? @invalid({}) : @result({ res: Number($s) })"
    },
    "compare": {
      "inputs": [{ "name": "a", "type": "number" }, { "name": "b", "type": "number" }],
      "outputs": [
        { "name": "less", "values": [] },
        { "name": "equal", "values": [] },
        { "name": "greater", "values": [] }
      ],
      "template": "$a < $b ? @less({}) : $a > $b ? @greater({}) : @equal({})"
    },
    "length": {
      "inputs": [{ "name": "s", "type": "string" }],
      "outputs": [{ "name": "result", "values": [{ "name": "res", "type": "number" }] }],
      "template": "@result({ res: $s.length })"
    }
  }
}"#;

// ── Catalog ─────────────────────────────────────────────────────────────────

struct CatalogEntry {
    definition: ProcDefinition,
    implementation: Implementation,
    origin: PathBuf,
}

/// Type and procedure catalog. Populated from JSON manifests.
pub struct Catalog {
    types: IndexMap<TypeId, (TypeDef, PathBuf)>,
    procedures: IndexMap<String, CatalogEntry>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

impl Catalog {
    pub fn new() -> Self {
        Catalog {
            types: IndexMap::new(),
            procedures: IndexMap::new(),
        }
    }

    /// The standard numeric and textual procedures.
    ///
    /// `BUILTIN_MANIFEST` is a compile-time constant validated like any user
    /// manifest; `builtin_manifest_loads` pins that it passes, so this cannot
    /// panic at run time.
    pub fn builtin() -> Self {
        let mut catalog = Catalog::new();
        catalog
            .add_manifest_str(BUILTIN_MANIFEST, Path::new(BUILTIN_ORIGIN))
            .expect("internal: built-in catalog manifest is valid");
        catalog
    }

    /// Load a manifest file. Returns the number of procedures added.
    pub fn load_manifest(&mut self, path: &Path) -> Result<usize, CatalogError> {
        let text = std::fs::read_to_string(path).map_err(|e| CatalogError::IoError {
            path: path.to_path_buf(),
            source: e,
        })?;
        self.add_manifest_str(&text, path)
    }

    /// Add manifest JSON text; `origin` names it in errors.
    pub fn add_manifest_str(&mut self, text: &str, origin: &Path) -> Result<usize, CatalogError> {
        let manifest: Manifest =
            serde_json::from_str(text).map_err(|e| CatalogError::JsonError {
                path: origin.to_path_buf(),
                source: e,
            })?;
        self.add_manifest(manifest, origin)
    }

    /// Add a decoded manifest. Nothing is added when any entry is invalid.
    pub fn add_manifest(&mut self, manifest: Manifest, origin: &Path) -> Result<usize, CatalogError> {
        for id in manifest.types.keys() {
            if let Some((_, first)) = self.types.get(id) {
                return Err(CatalogError::DuplicateType {
                    id: id.clone(),
                    first: first.clone(),
                    second: origin.to_path_buf(),
                });
            }
        }

        let mut entries = Vec::with_capacity(manifest.procedures.len());
        for (name, proc_manifest) in &manifest.procedures {
            if let Some(first) = self.procedures.get(name) {
                return Err(CatalogError::DuplicateProcedure {
                    name: name.clone(),
                    first: first.origin.clone(),
                    second: origin.to_path_buf(),
                });
            }
            let known_type =
                |ty: &TypeId| self.types.contains_key(ty) || manifest.types.contains_key(ty);
            let entry = build_entry(name, proc_manifest, origin, known_type)?;
            entries.push((name.clone(), entry));
        }

        for (id, host) in manifest.types {
            let def = TypeDef {
                id: id.clone(),
                host,
            };
            self.types.insert(id, (def, origin.to_path_buf()));
        }
        let count = entries.len();
        self.procedures.extend(entries);
        Ok(count)
    }

    /// Add one procedure programmatically.
    pub fn define(
        &mut self,
        name: &str,
        definition: ProcDefinition,
        template: &str,
    ) -> Result<(), CatalogError> {
        let mut manifest = Manifest::default();
        manifest.procedures.insert(
            name.to_string(),
            ProcManifest {
                definition,
                template: template.to_string(),
            },
        );
        self.add_manifest(manifest, Path::new(BUILTIN_ORIGIN))
            .map(|_| ())
    }

    /// Add one type programmatically.
    pub fn define_type(&mut self, id: &str, host: &str) -> Result<(), CatalogError> {
        let mut manifest = Manifest::default();
        manifest.types.insert(TypeId::new(id), host.to_string());
        self.add_manifest(manifest, Path::new(BUILTIN_ORIGIN))
            .map(|_| ())
    }

    pub fn procedures(&self) -> impl Iterator<Item = (&str, &ProcDefinition)> {
        self.procedures
            .iter()
            .map(|(name, entry)| (name.as_str(), &entry.definition))
    }

    pub fn types(&self) -> impl Iterator<Item = &TypeDef> {
        self.types.values().map(|(def, _)| def)
    }

    pub fn len(&self) -> usize {
        self.procedures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.procedures.is_empty()
    }

    /// Compact JSON of the whole catalog in insertion order.
    pub fn canonical_json(&self) -> String {
        let manifest = Manifest {
            types: self
                .types
                .iter()
                .map(|(id, (def, _))| (id.clone(), def.host.clone()))
                .collect(),
            procedures: self
                .procedures
                .iter()
                .map(|(name, entry)| {
                    (
                        name.clone(),
                        ProcManifest {
                            definition: entry.definition.clone(),
                            template: entry.implementation.template.source().to_string(),
                        },
                    )
                })
                .collect(),
        };
        serde_json::to_string(&manifest).unwrap_or_default()
    }
}

impl DefinitionCatalog for Catalog {
    fn lookup_definition(&self, proc_id: &str) -> Option<&ProcDefinition> {
        self.procedures.get(proc_id).map(|entry| &entry.definition)
    }

    fn lookup_type(&self, ty: &TypeId) -> Option<&TypeDef> {
        self.types.get(ty).map(|(def, _)| def)
    }
}

impl ImplementationCatalog for Catalog {
    fn lookup_implementation(&self, proc_id: &str) -> Option<&Implementation> {
        self.procedures
            .get(proc_id)
            .map(|entry| &entry.implementation)
    }

    fn host_type(&self, ty: &TypeId) -> Option<&str> {
        self.types.get(ty).map(|(def, _)| def.host.as_str())
    }
}

// ── Validation ──────────────────────────────────────────────────────────────

fn build_entry(
    name: &str,
    manifest: &ProcManifest,
    origin: &Path,
    known_type: impl Fn(&TypeId) -> bool,
) -> Result<CatalogEntry, CatalogError> {
    let invalid = |message: String| CatalogError::InvalidProcedure {
        path: origin.to_path_buf(),
        procedure: name.to_string(),
        message,
    };
    let definition = &manifest.definition;

    if let Some(ty) = definition.type_ids().find(|ty| !known_type(ty)) {
        return Err(invalid(format!("unknown type '{}'", ty)));
    }
    if let Some(dup) = first_duplicate(definition.inputs.iter().map(|s| s.name.as_str())) {
        return Err(invalid(format!("duplicate input slot '{}'", dup)));
    }
    if let Some(dup) = first_duplicate(definition.outputs.iter().map(|f| f.name.as_str())) {
        return Err(invalid(format!("duplicate output flow '{}'", dup)));
    }
    let suffixes: Vec<String> = definition.outputs.iter().map(|f| flow_suffix(&f.name)).collect();
    if let Some(dup) = first_duplicate(suffixes.iter().map(String::as_str)) {
        return Err(invalid(format!(
            "output flows collide as generated name '{}'",
            dup
        )));
    }
    for flow in &definition.outputs {
        if let Some(dup) = first_duplicate(flow.values.iter().map(|v| v.name.as_str())) {
            return Err(invalid(format!(
                "duplicate value '{}' in flow '{}'",
                dup, flow.name
            )));
        }
    }

    let template =
        Template::parse(&manifest.template).map_err(|errors| CatalogError::TemplateError {
            path: origin.to_path_buf(),
            procedure: name.to_string(),
            errors,
        })?;
    if let Some(input) = template
        .inputs()
        .into_iter()
        .find(|i| definition.input(i).is_none())
    {
        return Err(invalid(format!(
            "template reads undeclared input '{}'",
            input
        )));
    }
    if let Some(exit) = template
        .exits()
        .into_iter()
        .find(|e| definition.flow(e).is_none())
    {
        return Err(invalid(format!(
            "template exits through undeclared flow '{}'",
            exit
        )));
    }

    Ok(CatalogEntry {
        definition: definition.clone(),
        implementation: Implementation { template },
        origin: origin.to_path_buf(),
    })
}

fn first_duplicate<'a>(names: impl Iterator<Item = &'a str>) -> Option<&'a str> {
    let mut seen = std::collections::HashSet::new();
    names.into_iter().find(|n| !seen.insert(*n))
}
