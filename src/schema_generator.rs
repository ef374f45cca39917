use crate::declaration::{
    DeclarationGraph, Documentation, NamedType, PrimitiveKind, SourceFile, TypeDecl, TypeRef,
    TypeShape,
};
use crate::directive::{parse_schema_directive, SchemaDirective};
use crate::document::Schema;
use log::{debug, warn};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};

/// Property name used while resolving array items and map values
const ITEM_KEY: &str = "item";

/// What happens when an identifier is registered a second time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RegistrationPolicy {
    /// The later schema replaces the earlier one
    #[default]
    Overwrite,
    /// The first schema is kept; a differing later one is reported
    FirstWins,
}

/// Component identifier to schema mapping, rendered as `definitions`.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: BTreeMap<String, Schema>,
    policy: RegistrationPolicy,
}

impl SchemaRegistry {
    pub fn new(policy: RegistrationPolicy) -> Self {
        Self {
            schemas: BTreeMap::new(),
            policy,
        }
    }

    pub fn register(&mut self, id: &str, schema: Schema) {
        match (self.schemas.get(id), self.policy) {
            (None, _) => {
                debug!("Registering schema {}", id);
            }
            (Some(existing), _) if *existing == schema => return,
            (Some(_), RegistrationPolicy::Overwrite) => {
                debug!("Replacing schema {}", id);
            }
            (Some(_), RegistrationPolicy::FirstWins) => {
                warn!("Schema {} is already registered with a different shape, keeping the first", id);
                return;
            }
        }
        self.schemas.insert(id.to_string(), schema);
    }

    pub fn get(&self, id: &str) -> Option<&Schema> {
        self.schemas.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.schemas.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.schemas.keys().map(String::as_str)
    }

    pub fn into_definitions(self) -> BTreeMap<String, Schema> {
        self.schemas
    }
}

/// Mutable state of one generation run, threaded through every recursive call.
#[derive(Debug, Default)]
pub struct GenerationContext {
    pub registry: SchemaRegistry,
    /// Types whose schema is currently being built
    in_progress: HashSet<String>,
    /// Types that were referenced while still in progress
    cyclic: HashSet<String>,
}

impl GenerationContext {
    pub fn new(policy: RegistrationPolicy) -> Self {
        Self {
            registry: SchemaRegistry::new(policy),
            ..Self::default()
        }
    }

    pub fn into_registry(self) -> SchemaRegistry {
        self.registry
    }
}

/// Outcome of resolving a named type at a use site
enum NamedResolution {
    Schema(Schema),
    /// Properties to splice into the parent object
    Flatten(BTreeMap<String, Schema>),
    Skip,
}

/// Converts component type declarations into schemas.
///
/// Every type whose documentation carries `openapi:component schema <id>`
/// is generated and registered under `<id>`. Named types reached from a
/// component are registered under their own name and referenced; types
/// used through `#[serde(flatten)]` are spliced into the parent instead.
pub struct SchemaGenerator<'g> {
    graph: &'g DeclarationGraph,
    policy: RegistrationPolicy,
}

impl<'g> SchemaGenerator<'g> {
    pub fn new(graph: &'g DeclarationGraph, policy: RegistrationPolicy) -> Self {
        Self { graph, policy }
    }

    /// Generates every component in the graph, in file and declaration order.
    pub fn generate_all(&self) -> SchemaRegistry {
        let mut ctx = GenerationContext::new(self.policy);
        for file in &self.graph.files {
            for decl in &file.types {
                self.generate(&mut ctx, file, decl);
            }
        }
        debug!("Generated {} schemas", ctx.registry.len());
        ctx.into_registry()
    }

    /// Generates and registers one declaration if it is a component.
    pub fn generate(
        &self,
        ctx: &mut GenerationContext,
        file: &SourceFile,
        decl: &TypeDecl,
    ) -> Option<Schema> {
        let id = component_id(&decl.docs)?;
        debug!("Generating component {} from type {}", id, decl.name);

        let schema = self.type_schema(ctx, file, decl)?;

        // A cyclic reference points at the type name, which must resolve.
        if ctx.cyclic.remove(&decl.name) && id != decl.name {
            ctx.registry.register(&decl.name, schema.clone());
        }
        ctx.registry.register(&id, schema.clone());
        Some(schema)
    }

    fn type_schema(
        &self,
        ctx: &mut GenerationContext,
        file: &SourceFile,
        decl: &TypeDecl,
    ) -> Option<Schema> {
        ctx.in_progress.insert(decl.name.clone());
        let schema = self.shape_schema(ctx, file, decl);
        ctx.in_progress.remove(&decl.name);
        schema
    }

    /// Schema for the declaration's shape. The description always comes from
    /// the declaration's own docs, never from the field that uses it.
    fn shape_schema(
        &self,
        ctx: &mut GenerationContext,
        file: &SourceFile,
        decl: &TypeDecl,
    ) -> Option<Schema> {
        let description = non_empty(decl.docs.text());

        match &decl.shape {
            TypeShape::Struct(fields) => {
                let mut schema = Schema::object().with_description(description);
                for field in fields.iter().filter(|f| f.exported || f.embedded) {
                    let key = field.serialization_key.as_deref().unwrap_or(&field.name);
                    let properties =
                        self.field_schemas(ctx, file, &field.ty, key, field.embedded, &field.docs);
                    schema.properties.extend(properties);
                }
                Some(schema)
            }
            TypeShape::Alias(ty) => {
                let mut properties =
                    self.field_schemas(ctx, file, ty, &decl.name, false, &decl.docs);
                let schema = properties.remove(&decl.name).unwrap_or_default();
                Some(schema.with_description(description))
            }
            TypeShape::Enum(variants) => {
                let mut schema = Schema::primitive("string", None).with_description(description);
                schema.enum_values = variants.clone();
                Some(schema)
            }
            TypeShape::Opaque(reason) => {
                warn!("Type {} cannot be mapped to a schema: {}", decl.name, reason);
                None
            }
        }
    }

    /// Resolves one field (or alias target) into the properties it contributes.
    ///
    /// Usually that is a single entry under `name`. Flattened object types
    /// contribute all of their properties, unsupported types none.
    fn field_schemas(
        &self,
        ctx: &mut GenerationContext,
        file: &SourceFile,
        ty: &TypeRef,
        name: &str,
        embedded: bool,
        docs: &Documentation,
    ) -> BTreeMap<String, Schema> {
        let schema = match ty {
            TypeRef::Primitive(kind) => primitive_schema(*kind, name),
            TypeRef::Named(named) => match well_known_schema(named) {
                Some(schema) => schema,
                None => match self.named_schema(ctx, file, named, embedded) {
                    NamedResolution::Schema(schema) => schema,
                    NamedResolution::Flatten(properties) => return properties,
                    NamedResolution::Skip => return BTreeMap::new(),
                },
            },
            TypeRef::Sequence(element) => Schema::array(self.element_schema(ctx, file, element)),
            TypeRef::Map(value) => Schema::map(self.element_schema(ctx, file, value)),
            TypeRef::Indirect(inner) => {
                return self.field_schemas(ctx, file, inner, name, embedded, docs)
            }
            TypeRef::Any => Schema::object(),
            TypeRef::Unsupported(kind) => {
                warn!("Unsupported type ({}) for field {}, skipped", kind, name);
                return BTreeMap::new();
            }
        };

        BTreeMap::from([(name.to_string(), apply_doc_metadata(schema, docs))])
    }

    fn element_schema(&self, ctx: &mut GenerationContext, file: &SourceFile, ty: &TypeRef) -> Schema {
        self.field_schemas(ctx, file, ty, ITEM_KEY, false, &Documentation::default())
            .remove(ITEM_KEY)
            .unwrap_or_default()
    }

    fn named_schema(
        &self,
        ctx: &mut GenerationContext,
        file: &SourceFile,
        named: &NamedType,
        embedded: bool,
    ) -> NamedResolution {
        let graph = self.graph;
        let Some((target_file, target)) = graph.find_type(&named.name, &file.path) else {
            warn!(
                "Unable to find declaration of type {} used in {}",
                named.name,
                file.path.display()
            );
            return NamedResolution::Skip;
        };

        if ctx.in_progress.contains(&target.name) {
            if embedded {
                warn!("Type {} flattens itself, field skipped", target.name);
                return NamedResolution::Skip;
            }
            debug!("Cyclic reference to {}", target.name);
            ctx.cyclic.insert(target.name.clone());
            return NamedResolution::Schema(Schema::reference(&target.name));
        }

        let Some(schema) = self.type_schema(ctx, target_file, target) else {
            return NamedResolution::Skip;
        };

        if embedded {
            // Spliced properties may still point back at the type by name.
            if ctx.cyclic.remove(&target.name) {
                ctx.registry.register(&target.name, schema.clone());
            }
            return if schema.is_object() {
                NamedResolution::Flatten(schema.properties)
            } else {
                NamedResolution::Schema(schema)
            };
        }

        ctx.cyclic.remove(&target.name);
        ctx.registry.register(&target.name, schema);
        NamedResolution::Schema(Schema::reference(&target.name))
    }
}

/// Component identifier declared in `docs`; the last directive wins.
pub fn component_id(docs: &Documentation) -> Option<String> {
    docs.lines()
        .iter()
        .filter_map(|line| match parse_schema_directive(line) {
            Some(SchemaDirective::Component { id }) => Some(id),
            _ => None,
        })
        .last()
}

fn primitive_schema(kind: PrimitiveKind, name: &str) -> Schema {
    let (schema_type, format) = match kind {
        PrimitiveKind::Bool => ("boolean", None),
        PrimitiveKind::I8 | PrimitiveKind::U8 => ("integer", Some("int8")),
        PrimitiveKind::I16 | PrimitiveKind::U16 => ("integer", Some("int16")),
        PrimitiveKind::I32 | PrimitiveKind::U32 => ("integer", Some("int32")),
        PrimitiveKind::I64 | PrimitiveKind::U64 | PrimitiveKind::Isize | PrimitiveKind::Usize => {
            ("integer", Some("int64"))
        }
        PrimitiveKind::F32 => ("number", Some("float")),
        PrimitiveKind::F64 => ("number", Some("double")),
        PrimitiveKind::String => ("string", None),
        PrimitiveKind::Char | PrimitiveKind::I128 | PrimitiveKind::U128 => {
            warn!("No schema type for {:?} (field {}), using string", kind, name);
            ("string", None)
        }
    };
    Schema::primitive(schema_type, format)
}

/// Date, time and identifier types from well-known crates.
fn well_known_schema(named: &NamedType) -> Option<Schema> {
    let known_crate = named
        .qualifier
        .first()
        .map_or(true, |root| matches!(root.as_str(), "chrono" | "time" | "std" | "uuid"));
    if !known_crate {
        return None;
    }

    let format = match named.name.as_str() {
        "DateTime" | "NaiveDateTime" | "SystemTime" | "OffsetDateTime" | "PrimitiveDateTime" => {
            "date-time"
        }
        "NaiveDate" => "date",
        "Date" if !named.qualifier.is_empty() => "date",
        "Uuid" => "uuid",
        _ => return None,
    };
    Some(Schema::primitive("string", Some(format)))
}

/// Applies description and `example`/`format`/`default` directives.
fn apply_doc_metadata(mut schema: Schema, docs: &Documentation) -> Schema {
    schema.description = non_empty(docs.text());
    for line in docs.lines() {
        match parse_schema_directive(line) {
            Some(SchemaDirective::Example(value)) => schema.example = Some(Value::String(value)),
            Some(SchemaDirective::Format(value)) => schema.format = Some(value),
            Some(SchemaDirective::Default(value)) => schema.default = Some(Value::String(value)),
            _ => {}
        }
    }
    schema
}

fn non_empty(text: String) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}
