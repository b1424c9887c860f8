//! Type descriptor builder: resolves a declarative XML schema node into a
//! [Type] tree.
//!
//! Schema nodes come in two equivalent shapes. Registers (and some FIFOs)
//! use a recursive self-naming node whose tag is the kind and whose `Name`
//! child names it. Some FIFO declarations instead use a flat leaf carrying
//! a `SubType` child with the kind as text and no name; clusters and arrays
//! never appear in that shape.

use roxmltree::Node;

use crate::{
    errors::TypeError,
    fxp::Fxp,
    types::{FloatWidth, Type, TypeKind},
};

/// Resolves one schema node into a type tree, leaves first. Fails rather
/// than returning a partial tree.
pub fn parse_type(node: Node) -> Result<Type, TypeError> {
    let (kind_tag, name) = match element_child(node, "SubType").and_then(|sub| sub.text()) {
        Some(sub_type) => (sub_type.trim().to_string(), String::new()),
        None => (
            node.tag_name().name().to_string(),
            child_text(node, "Name").unwrap_or_default().to_string(),
        ),
    };

    match kind_tag.as_str() {
        "Boolean" => Ok(Type::new(name, TypeKind::Bool)),
        "Cluster" => parse_cluster(name, node),
        "Array" => parse_array(name, node),
        "FXP" => parse_fxp(name, node),
        "SGL" => Ok(Type::new(name, TypeKind::Float(FloatWidth::Sgl))),
        "DBL" => Ok(Type::new(name, TypeKind::Float(FloatWidth::Dbl))),
        "String" => Ok(Type::new(name, TypeKind::String)),
        "CFXP" => Err(TypeError::UnsupportedType(
            "CFXP: complex fixed point has no representable mapping".to_string(),
        )),
        other => parse_numeric(name, other),
    }
}

fn parse_cluster(name: String, node: Node) -> Result<Type, TypeError> {
    let type_list = element_child(node, "TypeList").ok_or_else(|| {
        TypeError::MalformedSchema(format!("cluster '{name}' has no TypeList"))
    })?;
    let members = type_list
        .children()
        .filter(Node::is_element)
        .map(parse_type)
        .collect::<Result<Vec<_>, _>>()?;
    Type::cluster(name, members)
}

fn parse_array(name: String, node: Node) -> Result<Type, TypeError> {
    let length = required_number(&name, node, "Size")?;
    let element = element_child(node, "Type")
        .and_then(|ty| ty.children().find(Node::is_element))
        .ok_or_else(|| {
            TypeError::MalformedSchema(format!("array '{name}' has no element Type"))
        })?;
    Ok(Type::array(name, parse_type(element)?, length))
}

fn parse_fxp(name: String, node: Node) -> Result<Type, TypeError> {
    // A missing Signed field marks output of a pre-2.1 LabVIEW FPGA
    // compiler, which laid FXP registers out differently.
    let signed = child_text(node, "Signed").ok_or_else(|| {
        TypeError::UnsupportedSchema(format!(
            "FXP '{name}' has no Signed field; bitfiles from unsupported compiler versions \
             cannot be used"
        ))
    })?;
    let signed = signed.trim().eq_ignore_ascii_case("true");
    let overflow_enabled = child_text(node, "IncludeOverflowStatus")
        .is_some_and(|text| text.trim().eq_ignore_ascii_case("true"));
    let word_length = required_number(&name, node, "WordLength")?;
    let integer_word_length = required_number(&name, node, "IntegerWordLength")?;
    let fxp = Fxp::new(word_length, integer_word_length, signed, overflow_enabled)?;
    Ok(Type::new(name, TypeKind::Fxp(fxp)))
}

/// Numeric tags have the form `[I|U]<bits>`, optionally with an enumerated
/// label prefix that does not change the wire format (an EnumU8 packs
/// exactly like a U8).
fn parse_numeric(name: String, tag: &str) -> Result<Type, TypeError> {
    let plain = tag.strip_prefix("Enum").unwrap_or(tag);
    let signed = match plain.chars().next() {
        Some('I') | Some('i') => true,
        Some('U') | Some('u') => false,
        _ => return Err(TypeError::UnsupportedType(tag.to_string())),
    };
    let bits = match plain[1..].parse::<u32>() {
        Ok(bits @ (8 | 16 | 32 | 64)) => bits,
        _ => return Err(TypeError::UnsupportedType(tag.to_string())),
    };
    Ok(Type::new(name, TypeKind::Numeric { signed, bits }))
}

fn required_number<T: std::str::FromStr>(
    name: &str,
    node: Node,
    tag: &'static str,
) -> Result<T, TypeError> {
    let text = child_text(node, tag).ok_or_else(|| {
        TypeError::MalformedSchema(format!("'{name}' has no {tag} field"))
    })?;
    text.trim().parse().map_err(|_| {
        TypeError::MalformedSchema(format!("'{name}' has a non-numeric {tag}: '{text}'"))
    })
}

pub(crate) fn element_child<'a, 'input>(
    node: Node<'a, 'input>,
    tag: &str,
) -> Option<Node<'a, 'input>> {
    node.children().find(|child| child.has_tag_name(tag))
}

pub(crate) fn child_text<'a>(node: Node<'a, '_>, tag: &str) -> Option<&'a str> {
    element_child(node, tag).and_then(|child| child.text())
}
