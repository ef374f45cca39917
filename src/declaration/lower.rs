//! Lowering of `syn` syntax trees into the declaration graph.

use super::{
    Documentation, FieldDecl, FunctionDecl, NamedType, PrimitiveKind, SourceFile, TypeDecl,
    TypeRef, TypeShape,
};
use crate::source::ParsedSource;
use log::debug;
use syn::ext::IdentExt;
use syn::meta::ParseNestedMeta;
use syn::{Attribute, Expr, Fields, GenericArgument, Item, Lit, PathArguments, Token, Type};

/// Serde attributes relevant to the emitted schema.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct SerdeAttributes {
    pub rename: Option<String>,
    pub skip: bool,
    pub flatten: bool,
}

/// Lowers one parsed source file.
pub fn lower_file(source: &ParsedSource) -> SourceFile {
    let mut file = SourceFile {
        path: source.path.clone(),
        docs: Documentation::new(doc_lines(&source.syntax_tree.attrs)),
        types: Vec::new(),
        functions: Vec::new(),
    };
    lower_items(&source.syntax_tree.items, &mut file);
    file
}

fn lower_items(items: &[Item], file: &mut SourceFile) {
    for item in items {
        match item {
            Item::Struct(item_struct) => file.types.push(TypeDecl {
                name: item_struct.ident.to_string(),
                docs: Documentation::new(doc_lines(&item_struct.attrs)),
                shape: lower_struct(&item_struct.fields),
            }),
            Item::Enum(item_enum) => file.types.push(TypeDecl {
                name: item_enum.ident.to_string(),
                docs: Documentation::new(doc_lines(&item_enum.attrs)),
                shape: lower_enum(item_enum),
            }),
            Item::Type(item_type) => file.types.push(TypeDecl {
                name: item_type.ident.to_string(),
                docs: Documentation::new(doc_lines(&item_type.attrs)),
                shape: TypeShape::Alias(lower_type(&item_type.ty)),
            }),
            Item::Fn(item_fn) => file.functions.push(FunctionDecl {
                name: item_fn.sig.ident.to_string(),
                docs: Documentation::new(doc_lines(&item_fn.attrs)),
            }),
            Item::Impl(item_impl) => {
                for impl_item in &item_impl.items {
                    if let syn::ImplItem::Fn(method) = impl_item {
                        file.functions.push(FunctionDecl {
                            name: method.sig.ident.to_string(),
                            docs: Documentation::new(doc_lines(&method.attrs)),
                        });
                    }
                }
            }
            Item::Mod(item_mod) => {
                if let Some((_, nested)) = &item_mod.content {
                    lower_items(nested, file);
                }
            }
            _ => {}
        }
    }
}

fn lower_struct(fields: &Fields) -> TypeShape {
    match fields {
        Fields::Named(named) => TypeShape::Struct(
            named
                .named
                .iter()
                .filter_map(lower_field)
                .collect(),
        ),
        Fields::Unnamed(unnamed) if unnamed.unnamed.len() == 1 => {
            TypeShape::Alias(lower_type(&unnamed.unnamed[0].ty))
        }
        Fields::Unnamed(unnamed) => {
            TypeShape::Opaque(format!("tuple struct with {} fields", unnamed.unnamed.len()))
        }
        Fields::Unit => TypeShape::Struct(Vec::new()),
    }
}

fn lower_field(field: &syn::Field) -> Option<FieldDecl> {
    let name = field.ident.as_ref()?.unraw().to_string();
    let serde = serde_attributes(&field.attrs);
    if serde.skip {
        debug!("Field {} is excluded from serialization", name);
        return None;
    }

    let serialization_key = serde
        .rename
        .as_deref()
        .and_then(|key| key.split(',').next())
        .filter(|key| !key.is_empty())
        .map(str::to_string);

    Some(FieldDecl {
        name,
        exported: !matches!(field.vis, syn::Visibility::Inherited),
        embedded: serde.flatten,
        serialization_key,
        ty: lower_type(&field.ty),
        docs: Documentation::new(doc_lines(&field.attrs)),
    })
}

fn lower_enum(item_enum: &syn::ItemEnum) -> TypeShape {
    if item_enum
        .variants
        .iter()
        .any(|v| !matches!(v.fields, Fields::Unit))
    {
        return TypeShape::Opaque("enum with data-carrying variants".to_string());
    }

    TypeShape::Enum(
        item_enum
            .variants
            .iter()
            .filter_map(|v| {
                let serde = serde_attributes(&v.attrs);
                if serde.skip {
                    None
                } else {
                    Some(serde.rename.unwrap_or_else(|| v.ident.unraw().to_string()))
                }
            })
            .collect(),
    )
}

/// Resolves a syntactic type into the graph's type model.
pub(crate) fn lower_type(ty: &Type) -> TypeRef {
    match ty {
        Type::Path(type_path) => lower_path(&type_path.path),
        Type::Reference(reference) => TypeRef::Indirect(Box::new(lower_type(&reference.elem))),
        Type::Ptr(ptr) => TypeRef::Indirect(Box::new(lower_type(&ptr.elem))),
        Type::Slice(slice) => TypeRef::Sequence(Box::new(lower_type(&slice.elem))),
        Type::Array(array) => TypeRef::Sequence(Box::new(lower_type(&array.elem))),
        Type::Paren(paren) => lower_type(&paren.elem),
        Type::Group(group) => lower_type(&group.elem),
        Type::TraitObject(_) | Type::ImplTrait(_) => TypeRef::Any,
        Type::Tuple(tuple) if tuple.elems.is_empty() => TypeRef::Unsupported("unit".to_string()),
        Type::Tuple(_) => TypeRef::Unsupported("tuple".to_string()),
        Type::BareFn(_) => TypeRef::Unsupported("fn pointer".to_string()),
        Type::Never(_) => TypeRef::Unsupported("never".to_string()),
        Type::Macro(_) => TypeRef::Unsupported("macro".to_string()),
        Type::Infer(_) => TypeRef::Unsupported("inferred".to_string()),
        _ => TypeRef::Unsupported("unknown".to_string()),
    }
}

fn lower_path(path: &syn::Path) -> TypeRef {
    let Some(last) = path.segments.last() else {
        return TypeRef::Unsupported("empty path".to_string());
    };
    let name = last.ident.to_string();
    let qualifier: Vec<String> = path
        .segments
        .iter()
        .take(path.segments.len() - 1)
        .map(|s| s.ident.to_string())
        .collect();
    let type_args = type_arguments(&last.arguments);

    let std_path = qualifier
        .first()
        .map_or(true, |root| matches!(root.as_str(), "std" | "core" | "alloc"));
    if std_path {
        if let Some(kind) = primitive_kind(&name) {
            return TypeRef::Primitive(kind);
        }
    }

    if name == "Value" && qualifier.last().map(String::as_str) == Some("serde_json") {
        return TypeRef::Any;
    }

    match name.as_str() {
        "Option" | "Box" | "Rc" | "Arc" | "Cow" | "RefCell" | "Cell" => {
            return wrap(&name, type_args.first(), TypeRef::Indirect);
        }
        "Vec" | "VecDeque" | "LinkedList" | "HashSet" | "BTreeSet" | "IndexSet" | "BinaryHeap" => {
            return wrap(&name, type_args.first(), TypeRef::Sequence);
        }
        "HashMap" | "BTreeMap" | "IndexMap" => return wrap(&name, type_args.get(1), TypeRef::Map),
        _ => {}
    }

    TypeRef::Named(NamedType { name, qualifier })
}

fn wrap(container: &str, arg: Option<&&Type>, make: fn(Box<TypeRef>) -> TypeRef) -> TypeRef {
    match arg {
        Some(inner) => make(Box::new(lower_type(inner))),
        None => TypeRef::Unsupported(format!("{} without type argument", container)),
    }
}

fn type_arguments(arguments: &PathArguments) -> Vec<&Type> {
    match arguments {
        PathArguments::AngleBracketed(args) => args
            .args
            .iter()
            .filter_map(|arg| match arg {
                GenericArgument::Type(ty) => Some(ty),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn primitive_kind(name: &str) -> Option<PrimitiveKind> {
    let kind = match name {
        "bool" => PrimitiveKind::Bool,
        "i8" => PrimitiveKind::I8,
        "i16" => PrimitiveKind::I16,
        "i32" => PrimitiveKind::I32,
        "i64" => PrimitiveKind::I64,
        "i128" => PrimitiveKind::I128,
        "isize" => PrimitiveKind::Isize,
        "u8" => PrimitiveKind::U8,
        "u16" => PrimitiveKind::U16,
        "u32" => PrimitiveKind::U32,
        "u64" => PrimitiveKind::U64,
        "u128" => PrimitiveKind::U128,
        "usize" => PrimitiveKind::Usize,
        "f32" => PrimitiveKind::F32,
        "f64" => PrimitiveKind::F64,
        "char" => PrimitiveKind::Char,
        "String" | "str" => PrimitiveKind::String,
        _ => return None,
    };
    Some(kind)
}

/// Collects doc-comment lines from `#[doc = "..."]` attributes.
///
/// Line comments lose the single space following `///`; block comments are
/// split into lines with their leading `*` decoration removed.
pub(crate) fn doc_lines(attrs: &[Attribute]) -> Vec<String> {
    let mut lines = Vec::new();
    for attr in attrs {
        if !attr.path().is_ident("doc") {
            continue;
        }
        let syn::Meta::NameValue(name_value) = &attr.meta else {
            continue;
        };
        let Expr::Lit(expr_lit) = &name_value.value else {
            continue;
        };
        let Lit::Str(text) = &expr_lit.lit else {
            continue;
        };

        let value = text.value();
        if value.contains('\n') {
            for line in value.lines() {
                let line = line.trim_start();
                let line = line
                    .strip_prefix("* ")
                    .or_else(|| line.strip_prefix('*'))
                    .unwrap_or(line);
                lines.push(line.trim_end().to_string());
            }
            // A block comment's closing line is pure decoration.
            while lines.last().is_some_and(|l| l.is_empty()) {
                lines.pop();
            }
        } else {
            let line = value.strip_prefix(' ').unwrap_or(&value);
            lines.push(line.trim_end().to_string());
        }
    }
    lines
}

pub(crate) fn serde_attributes(attrs: &[Attribute]) -> SerdeAttributes {
    let mut serde = SerdeAttributes::default();
    for attr in attrs.iter().filter(|a| a.path().is_ident("serde")) {
        let parsed = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                if meta.input.peek(Token![=]) {
                    let value: syn::LitStr = meta.value()?.parse()?;
                    serde.rename = Some(value.value());
                } else {
                    meta.parse_nested_meta(|inner| {
                        if inner.path.is_ident("serialize") {
                            let value: syn::LitStr = inner.value()?.parse()?;
                            serde.rename = Some(value.value());
                            Ok(())
                        } else {
                            skip_meta(&inner)
                        }
                    })?;
                }
            } else if meta.path.is_ident("flatten") {
                serde.flatten = true;
            } else if meta.path.is_ident("skip") || meta.path.is_ident("skip_serializing") {
                serde.skip = true;
            } else {
                skip_meta(&meta)?;
            }
            Ok(())
        });

        if let Err(e) = parsed {
            debug!("Ignoring unparsable serde attribute: {}", e);
        }
    }
    serde
}

/// Consumes the value of a serde option this crate does not interpret.
fn skip_meta(meta: &ParseNestedMeta) -> syn::Result<()> {
    if meta.input.peek(Token![=]) {
        meta.value()?.parse::<Expr>()?;
    } else if meta.input.peek(syn::token::Paren) {
        meta.parse_nested_meta(|inner| skip_meta(&inner))?;
    }
    Ok(())
}
