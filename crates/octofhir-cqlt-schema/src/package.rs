//! FHIR NPM packages
//!
//! Published definitions ship as packages such as
//! `hl7.fhir.r4.core-4.0.1.tgz`, holding one
//! `package/StructureDefinition-*.json` file per definition. A package is
//! read either as the tarball or as its extracted directory (the layout of
//! `~/.fhir/packages/hl7.fhir.r4.core#4.0.1`).

use crate::definition::ResourceDefinition;
use crate::error::{SchemaError, SchemaResult};
use crate::loader::parse_structure_definition;
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::Read;
use std::path::Path;

const PACKAGE_DIR: &str = "package";
const DEFINITION_PREFIX: &str = "StructureDefinition-";

/// Every base definition in a package tarball or directory
pub fn load_package_definitions(path: &Path) -> SchemaResult<Vec<ResourceDefinition>> {
    if path.is_dir() {
        let nested = path.join(PACKAGE_DIR);
        let dir = if nested.is_dir() { nested } else { path.to_path_buf() };
        load_directory(&dir)
    } else {
        load_tarball(path)
    }
}

fn is_definition_file(file_name: &str) -> bool {
    file_name.starts_with(DEFINITION_PREFIX) && file_name.ends_with(".json")
}

fn io_error(path: &Path, error: impl std::fmt::Display) -> SchemaError {
    SchemaError::Io(format!("{}: {}", path.display(), error))
}

fn load_directory(dir: &Path) -> SchemaResult<Vec<ResourceDefinition>> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(|e| io_error(dir, e))? {
        let path = entry.map_err(|e| io_error(dir, e))?.path();
        if path.file_name().and_then(|n| n.to_str()).is_some_and(is_definition_file) {
            files.push(path);
        }
    }
    files.sort();

    let mut definitions = Vec::new();
    for path in files {
        let json = std::fs::read_to_string(&path).map_err(|e| io_error(&path, e))?;
        definitions.extend(parse_file(&path.display().to_string(), &json)?);
    }
    log::debug!("read {} definitions from {}", definitions.len(), dir.display());
    Ok(definitions)
}

fn load_tarball(path: &Path) -> SchemaResult<Vec<ResourceDefinition>> {
    let file = File::open(path).map_err(|e| io_error(path, e))?;
    let mut archive = tar::Archive::new(GzDecoder::new(file));

    let mut definitions = Vec::new();
    for entry in archive.entries().map_err(|e| io_error(path, e))? {
        let mut entry = entry.map_err(|e| io_error(path, e))?;
        let entry_path = entry.path().map_err(|e| io_error(path, e))?.into_owned();
        let in_package = entry_path.parent().is_some_and(|parent| parent == Path::new(PACKAGE_DIR));
        let is_definition = entry_path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(is_definition_file);
        if !(in_package && is_definition) {
            continue;
        }

        let mut json = String::new();
        entry.read_to_string(&mut json).map_err(|e| io_error(path, e))?;
        definitions.extend(parse_file(&entry_path.display().to_string(), &json)?);
    }
    log::debug!("read {} definitions from {}", definitions.len(), path.display());
    Ok(definitions)
}

fn parse_file(source_name: &str, json: &str) -> SchemaResult<Vec<ResourceDefinition>> {
    let resource = serde_json::from_str(json).map_err(|e| SchemaError::parse(source_name, e))?;
    parse_structure_definition(source_name, resource)
}
