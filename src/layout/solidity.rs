//! Solidity declaration front-end for the layout resolver.
//!
//! Understands the elementary value types and fixed-size arrays of them, which
//! is everything that is stored in place. Dynamic types (`string`, `bytes`,
//! `T[]`, `mapping`) keep their data at hashed locations and are rejected.

use super::{FieldSpec, LayoutError, Visibility};
use crate::constants::WORD_BYTES;

/// Byte width of an elementary Solidity value type, `None` if it has no fixed
/// in-place width.
pub fn elementary_width(ty: &str) -> Option<usize> {
    match ty {
        "bool" => return Some(1),
        "address" => return Some(20),
        "uint" | "int" => return Some(WORD_BYTES),
        _ => {}
    }
    if let Some(bits) = ty.strip_prefix("uint").or_else(|| ty.strip_prefix("int")) {
        let bits: usize = bits.parse().ok()?;
        return (bits % 8 == 0 && (8..=256).contains(&bits)).then_some(bits / 8);
    }
    if let Some(bytes) = ty.strip_prefix("bytes") {
        let bytes: usize = bytes.parse().ok()?;
        return (1..=WORD_BYTES).contains(&bytes).then_some(bytes);
    }
    None
}

/// Build a [`FieldSpec`] from a name and a Solidity type such as `uint16` or
/// `bytes32[3]`.
pub fn parse_type(name: &str, ty: &str, visibility: Visibility) -> Result<FieldSpec, LayoutError> {
    let ty = ty.trim();
    let unsupported = || LayoutError::UnsupportedType { name: name.to_string(), ty: ty.to_string() };

    let spec = match ty.split_once('[') {
        Some((element, dims)) => {
            let count = dims.strip_suffix(']').ok_or_else(unsupported)?;
            if count.contains('[') || count.contains(']') {
                return Err(unsupported());
            }
            let count: usize = count.trim().parse().map_err(|_| unsupported())?;
            let width = elementary_width(element.trim()).ok_or_else(unsupported)?;
            FieldSpec::array(name, width, count)
        }
        None => FieldSpec::scalar(name, elementary_width(ty).ok_or_else(unsupported)?),
    };
    Ok(spec.with_visibility(visibility))
}

/// Parse a contract's storage section into declarations, in order.
///
/// Accepts one state variable per statement, e.g.
/// `uint8 private flattening = 10;`. Line comments are ignored, as are
/// `constant` and `immutable` variables, which do not occupy storage.
pub fn parse_storage_section(source: &str) -> Result<Vec<FieldSpec>, LayoutError> {
    let stripped: String = source
        .lines()
        .map(|line| line.split("//").next().unwrap_or_default())
        .collect::<Vec<_>>()
        .join("\n");

    let mut fields = Vec::new();
    for statement in stripped.split(';') {
        let statement = statement.trim();
        let declaration = if statement.starts_with("mapping") {
            statement
        } else {
            statement.split('=').next().unwrap_or_default().trim()
        };
        if declaration.is_empty() {
            continue;
        }
        if let Some(field) = parse_declaration(declaration)? {
            fields.push(field);
        }
    }
    Ok(fields)
}

fn parse_declaration(declaration: &str) -> Result<Option<FieldSpec>, LayoutError> {
    let malformed = || LayoutError::MalformedDeclaration(declaration.to_string());
    if declaration.starts_with("mapping") {
        let name = declaration.rsplit(char::is_whitespace).next().unwrap_or_default();
        return Err(LayoutError::UnsupportedType { name: name.to_string(), ty: "mapping".into() });
    }

    let mut tokens = declaration.split_whitespace();
    let ty = tokens.next().ok_or_else(malformed)?;

    let mut visibility = Visibility::Internal;
    let mut name = None;
    for token in tokens {
        match token {
            "public" => visibility = Visibility::Public,
            "private" => visibility = Visibility::Private,
            "internal" => visibility = Visibility::Internal,
            "constant" | "immutable" => return Ok(None),
            "payable" if name.is_none() && ty == "address" => {}
            other if name.is_none() => name = Some(other),
            _ => return Err(malformed()),
        }
    }

    let name = name.ok_or_else(malformed)?;
    parse_type(name, ty, visibility).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{resolve, SlotLayout};

    const PRIVACY_SOURCE: &str = r#"
        bool public locked = true;
        uint256 public ID = block.timestamp;
        uint8 private flattening = 10;
        uint8 private denomination = 255;
        uint16 private awkwardness = uint16(block.timestamp);
        bytes32[3] private data;
    "#;

    #[test]
    fn test_elementary_widths() {
        assert_eq!(elementary_width("bool"), Some(1));
        assert_eq!(elementary_width("address"), Some(20));
        assert_eq!(elementary_width("uint"), Some(32));
        assert_eq!(elementary_width("uint8"), Some(1));
        assert_eq!(elementary_width("int128"), Some(16));
        assert_eq!(elementary_width("bytes16"), Some(16));
        assert_eq!(elementary_width("bytes32"), Some(32));
        assert_eq!(elementary_width("uint7"), None);
        assert_eq!(elementary_width("uint264"), None);
        assert_eq!(elementary_width("bytes33"), None);
        assert_eq!(elementary_width("bytes"), None);
        assert_eq!(elementary_width("string"), None);
    }

    #[test]
    fn test_parse_privacy_section_matches_fixture() {
        let fields = parse_storage_section(PRIVACY_SOURCE).unwrap();
        assert_eq!(fields, SlotLayout::privacy_fields());
        assert_eq!(resolve(&fields).unwrap(), SlotLayout::privacy());
    }

    #[test]
    fn test_parse_array_type() {
        let spec = parse_type("data", "bytes32[3]", Visibility::Private).unwrap();
        assert_eq!(spec, FieldSpec::array("data", 32, 3).private());
    }

    #[test]
    fn test_comments_constants_and_payable() {
        let source = "
            // owner slot
            address payable owner; // 20 bytes
            uint256 constant FEE = 3;
            address immutable deployer;
            uint96 internal nonce;
        ";
        let fields = parse_storage_section(source).unwrap();
        assert_eq!(fields, vec![FieldSpec::scalar("owner", 20), FieldSpec::scalar("nonce", 12)]);
        let layout = resolve(&fields).unwrap();
        assert_eq!(layout.placement("nonce").unwrap().offset, 20);
    }

    #[test]
    fn test_dynamic_types_are_rejected() {
        for source in ["string private secret;", "bytes blob;", "uint256[] xs;", "uint8[2][3] grid;"] {
            assert!(
                matches!(parse_storage_section(source), Err(LayoutError::UnsupportedType { .. })),
                "{source}"
            );
        }
        assert!(matches!(
            parse_storage_section("mapping(address => uint256) balances;"),
            Err(LayoutError::UnsupportedType { .. })
        ));
    }

    #[test]
    fn test_malformed_declarations() {
        assert!(matches!(
            parse_storage_section("uint256 public;"),
            Err(LayoutError::MalformedDeclaration(_))
        ));
        assert!(matches!(
            parse_storage_section("uint256 a b;"),
            Err(LayoutError::MalformedDeclaration(_))
        ));
    }
}
