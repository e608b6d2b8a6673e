//! Security invariant tests for the ecomm-gateway client.
//!
//! These tests scan the production sources of the workspace so that later
//! changes cannot quietly weaken the TLS setup or leak merchant secrets.
//! They run on every `cargo test --workspace` invocation.

use regex::Regex;
use std::path::Path;
use walkdir::WalkDir;

/// Read all .rs source files from production crates (excluding tests and this crate).
fn production_source_files() -> Vec<(String, String)> {
    let root = Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap();

    let crates_dir = root.join("crates");
    let mut files = Vec::new();

    for entry in WalkDir::new(&crates_dir).into_iter().filter_map(|e| e.ok()) {
        let path = entry.path();

        if path.extension().and_then(|e| e.to_str()) != Some("rs") {
            continue;
        }

        if path
            .to_str()
            .map(|s| s.contains("security-audit"))
            .unwrap_or(false)
        {
            continue;
        }

        let path_str = path.to_str().unwrap_or("");
        if path_str.contains("tests/") || path_str.contains("\\tests\\") {
            continue;
        }

        if let Ok(content) = std::fs::read_to_string(path) {
            files.push((path_str.to_string(), content));
        }
    }

    files
}

/// Filter to only lines outside of `#[cfg(test)]` modules and `mod tests` blocks.
/// This is a heuristic: it removes everything after `#[cfg(test)]` in a file.
fn production_lines(content: &str) -> String {
    let mut result = Vec::new();
    let mut in_test_module = false;

    for line in content.lines() {
        if line.contains("#[cfg(test)]") || line.trim().starts_with("mod tests") {
            in_test_module = true;
        }
        if !in_test_module {
            result.push(line);
        }
    }

    result.join("\n")
}

#[test]
fn sources_are_found() {
    let files = production_source_files();
    assert!(
        files.iter().any(|(path, _)| path.ends_with("transport.rs")),
        "security audit could not locate the transport module"
    );
}

#[test]
fn certificate_verification_only_disabled_behind_named_flag() {
    let files = production_source_files();

    for (path, content) in &files {
        let prod_content = production_lines(content);

        for (i, line) in prod_content.lines().enumerate() {
            if !line.contains("danger_accept_invalid_certs") {
                continue;
            }

            assert!(
                path.ends_with("transport.rs"),
                "danger_accept_invalid_certs used outside the transport module at {}:{}",
                path,
                i + 1
            );

            // The call must sit inside an `if config.insecure_skip_verify()` block.
            let preceding: Vec<&str> = prod_content.lines().take(i).collect();
            let context = preceding[preceding.len().saturating_sub(8)..].join("\n");
            assert!(
                context.contains("insecure_skip_verify()"),
                "danger_accept_invalid_certs at {}:{} is not gated by insecure_skip_verify",
                path,
                i + 1
            );
            assert!(
                context.contains("warn!"),
                "disabling certificate verification at {}:{} must log a warning",
                path,
                i + 1
            );
        }
    }
}

#[test]
fn http_clients_disable_redirects() {
    let files = production_source_files();
    let builder_re = Regex::new(r"reqwest::Client::builder\(\)").unwrap();
    let redirect_re = Regex::new(r"redirect\s*\(\s*.*Policy::none\(\)").unwrap();

    for (path, content) in &files {
        let prod_content = production_lines(content);

        for mat in builder_re.find_iter(&prod_content) {
            let search_end = (mat.end() + 500).min(prod_content.len());
            let builder_chain = &prod_content[mat.start()..search_end];

            assert!(
                redirect_re.is_match(builder_chain),
                "reqwest::Client::builder() at {} does not set redirect(Policy::none()). \
                 A redirect would resend the card command to an unpinned host.",
                path
            );
        }
    }
}

#[test]
fn passphrase_is_never_logged() {
    let files = production_source_files();
    let log_re = Regex::new(r"tracing::(trace|debug|info|warn|error)!|\b(trace|debug|info|warn|error)!\(")
        .unwrap();

    for (path, content) in &files {
        let prod_content = production_lines(content);
        let lines: Vec<&str> = prod_content.lines().collect();

        for (i, line) in lines.iter().enumerate() {
            if !log_re.is_match(line) {
                continue;
            }

            // Inspect the macro invocation up to its closing `);`.
            let invocation: String = lines[i..]
                .iter()
                .take_while(|l| !l.trim_end().ends_with(");"))
                .chain(lines[i..].iter().find(|l| l.trim_end().ends_with(");")))
                .copied()
                .collect::<Vec<_>>()
                .join("\n");

            assert!(
                !invocation.contains("passphrase()") && !invocation.contains(".passphrase"),
                "log statement at {}:{} references the certificate passphrase",
                path,
                i + 1
            );
            assert!(
                !invocation.contains("identity()"),
                "log statement at {}:{} references the client identity bytes",
                path,
                i + 1
            );
        }
    }
}

#[test]
fn config_debug_is_redacted() {
    let files = production_source_files();

    for (path, content) in &files {
        if !path.ends_with("config.rs") || !content.contains("pub struct GatewayConfig") {
            continue;
        }

        let prod_content = production_lines(content);
        let struct_pos = prod_content
            .find("pub struct GatewayConfig")
            .expect("GatewayConfig definition");
        let header = &prod_content[..struct_pos];
        let derive_line = header.lines().rev().find(|l| l.contains("#[derive"));

        assert!(
            !derive_line.map(|l| l.contains("Debug")).unwrap_or(false),
            "GatewayConfig at {} derives Debug, which would print the passphrase",
            path
        );
        assert!(
            prod_content.contains("impl fmt::Debug for GatewayConfig"),
            "GatewayConfig at {} needs a hand-written, redacting Debug impl",
            path
        );
    }
}

#[test]
fn library_does_not_panic_on_gateway_input() {
    let files = production_source_files();
    let panic_re = Regex::new(r"\.unwrap\(\)|\.expect\(|panic!\(|\[\s*\d+\s*\]").unwrap();

    for (path, content) in &files {
        let normalized = path.replace('\\', "/");
        if !normalized.contains("crates/ecomm-gateway/src/") {
            continue;
        }

        let prod_content = production_lines(content);
        for (i, line) in prod_content.lines().enumerate() {
            let code = line.split("//").next().unwrap_or("");
            assert!(
                !panic_re.is_match(code),
                "possible panic in library code at {}:{}: {}",
                path,
                i + 1,
                line.trim()
            );
        }
    }
}

#[test]
fn no_hardcoded_passphrases() {
    let files = production_source_files();
    let secret_re =
        Regex::new(r#"(?i)(passphrase|password)\s*(:|=)\s*(Some\()?\s*"[^"]+""#).unwrap();

    for (path, content) in &files {
        let prod_content = production_lines(content);

        for (i, line) in prod_content.lines().enumerate() {
            assert!(
                !secret_re.is_match(line),
                "possible hardcoded passphrase at {}:{}: {}",
                path,
                i + 1,
                line.trim()
            );
        }
    }
}
