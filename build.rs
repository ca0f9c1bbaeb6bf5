use std::env;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

const LOCALES_DIR: &str = "locales";
const DEFAULT_LOCALE: &str = "en-US";

fn main() {
    println!("cargo:rerun-if-changed={LOCALES_DIR}");

    let mut locales = Vec::new();
    let mut entries = fs::read_dir(LOCALES_DIR)
        .map(|dir| dir.filter_map(Result::ok).map(|e| e.path()).collect())
        .unwrap_or_else(|_| Vec::<PathBuf>::new());
    entries.sort();

    for path in entries {
        if path.extension().and_then(|ext| ext.to_str()) != Some("toml") {
            continue;
        }
        let Some(locale) = path.file_stem().and_then(|stem| stem.to_str()) else {
            continue;
        };
        println!("cargo:rerun-if-changed={}", path.display());
        locales.push((locale.to_string(), load_locale(&path)));
    }

    let mut out = String::new();
    writeln!(out, "pub const DEFAULT_LOCALE: &str = {DEFAULT_LOCALE:?};").unwrap();
    writeln!(out, "pub static LOCALES: &[(&str, &[(&str, &str)])] = &[").unwrap();
    for (locale, messages) in &locales {
        writeln!(out, "    ({locale:?}, &[").unwrap();
        for (key, value) in messages {
            writeln!(out, "        ({key:?}, {value:?}),").unwrap();
        }
        writeln!(out, "    ]),").unwrap();
    }
    writeln!(out, "];").unwrap();

    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR is set by cargo"));
    fs::write(out_dir.join("schoolform_i18n_generated.rs"), out)
        .expect("failed to write generated i18n catalog");
}

fn load_locale(path: &Path) -> Vec<(String, String)> {
    let contents = fs::read_to_string(path)
        .unwrap_or_else(|error| panic!("failed to read {}: {error}", path.display()));
    let table: toml::Table = toml::from_str(&contents)
        .unwrap_or_else(|error| panic!("failed to parse {}: {error}", path.display()));
    let mut messages = Vec::new();
    flatten("", &table, &mut messages);
    messages.sort();
    messages
}

fn flatten(prefix: &str, table: &toml::Table, out: &mut Vec<(String, String)>) {
    for (key, value) in table {
        let full_key = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            toml::Value::String(text) => out.push((full_key, text.clone())),
            toml::Value::Table(nested) => flatten(&full_key, nested, out),
            other => panic!("locale key `{full_key}` must be a string or table, found {other}"),
        }
    }
}
