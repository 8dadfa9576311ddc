//! Object path recognition
//!
//! A full path is partition-qualified: `/Common/web_pool`,
//! `/Tenant/app/web_vs`. Only tokens of that shape count as object names or
//! as references.

/// Whether `token` looks like a partition-qualified object path
pub fn is_object_path(token: &str) -> bool {
    let mut chars = token.chars();
    chars.next() == Some('/') && chars.next().is_some_and(is_name_char)
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Characters allowed inside a path found in free text
fn is_path_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '/' | '_' | '-' | '.' | ':' | '%' | '~')
}

/// The object named by a pool member or destination.
///
/// - `/Common/n1:80` names node `/Common/n1`
/// - `/Common/2001:db8::1.443` names node `/Common/2001:db8::1`
/// - `/Common/server1:/Common/vs1` (GTM) names server `/Common/server1`
/// - anything without a port is returned unchanged
pub fn member_target(item: &str) -> &str {
    if let Some(split) = item.find(":/") {
        return &item[..split];
    }
    let name_start = item.rfind('/').map_or(0, |i| i + 1);
    let name = &item[name_start..];
    let cut = if name.matches(':').count() > 1 {
        name.rfind('.')
    } else {
        name.rfind(':')
    };
    match cut {
        Some(i) if i > 0 => &item[..name_start + i],
        _ => item,
    }
}

/// Every path-like token in a piece of free text, in order of appearance
pub fn embedded_paths(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !is_path_char(c))
        .map(|token| token.trim_end_matches(['.', ':', '-']))
        .filter(|token| is_object_path(token))
}
