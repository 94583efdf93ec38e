use regex::Regex;
use semver::Version;
use std::sync::LazyLock;

static VERSION_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"version "([^"]+)""#).unwrap());

/// Extract the Java version from `java -version` output.
///
/// Handles both the legacy `1.8.0_381` scheme (reported as `8.0.381`) and the
/// modern `17.0.8` / `21` scheme. Pre-release and build suffixes are dropped.
pub fn parse_java_version(output: &str) -> Option<Version> {
    let raw = VERSION_LINE.captures(output)?.get(1)?.as_str();
    normalise(raw)
}

fn normalise(raw: &str) -> Option<Version> {
    let core = raw
        .split(['-', '+'])
        .next()
        .unwrap_or(raw)
        .trim();

    let mut parts: Vec<u64> = core
        .split(['.', '_'])
        .map(|p| p.parse::<u64>())
        .collect::<Result<_, _>>()
        .ok()?;
    if parts.is_empty() {
        return None;
    }
    if parts[0] == 1 && parts.len() > 1 {
        // 1.8.0_381 -> 8.0.381
        parts.remove(0);
        if parts.len() >= 3 {
            let update = parts.pop().unwrap_or(0);
            parts.truncate(1);
            parts.push(0);
            parts.push(update);
        }
    }
    parts.resize(3, 0);
    Some(Version::new(parts[0], parts[1], parts[2]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modern_versions() {
        let out = "openjdk version \"17.0.8\" 2023-07-18\nOpenJDK Runtime Environment";
        assert_eq!(parse_java_version(out), Some(Version::new(17, 0, 8)));
        assert_eq!(
            parse_java_version("java version \"21\" 2023-09-19"),
            Some(Version::new(21, 0, 0))
        );
        assert_eq!(
            parse_java_version("openjdk version \"22-ea\" 2024-03-19"),
            Some(Version::new(22, 0, 0))
        );
        assert_eq!(
            parse_java_version("openjdk version \"11.0.21+9\""),
            Some(Version::new(11, 0, 21))
        );
    }

    #[test]
    fn test_legacy_versions() {
        assert_eq!(
            parse_java_version("java version \"1.8.0_381\""),
            Some(Version::new(8, 0, 381))
        );
        assert_eq!(
            parse_java_version("java version \"1.8\""),
            Some(Version::new(8, 0, 0))
        );
    }

    #[test]
    fn test_garbage_is_none() {
        assert_eq!(parse_java_version("command not found"), None);
        assert_eq!(parse_java_version("version \"abc\""), None);
    }
}
