//! Top-level entry points: render a template, parse its tables, run them.

use std::path::{Path, PathBuf};
use std::time::Instant;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use fauxdata_template::{Rendered, TemplateRenderer, Variables};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde_yaml::Value as YamlValue;
use tracing::{info, warn};

use crate::errors::{TableError, TemplateError};
use crate::model::{RunReport, TableOutcome};
use crate::table::{GeneratedTable, Table};

const TEMPLATE_EXTENSIONS: &[&str] = &["yaml", "yml"];

/// A rendered, parsed template ready to generate.
#[derive(Debug)]
pub struct Template {
    tables: Vec<Table>,
    rendered: Rendered,
    seed: Option<u64>,
}

impl Template {
    /// Render `text` with `params` and parse every table in it.
    pub fn from_text(text: &str, params: &Variables) -> Result<Template, TemplateError> {
        Template::from_text_with(&TemplateRenderer::new(), text, params, None)
    }

    /// As [`Template::from_text`] with an explicit renderer; relative row
    /// sources resolve against `base`.
    pub fn from_text_with(
        renderer: &TemplateRenderer,
        text: &str,
        params: &Variables,
        base: Option<&Path>,
    ) -> Result<Template, TemplateError> {
        let rendered = renderer.render(text, params)?;
        let tables = parse_tables(&rendered.text, base)?;
        info!(tables = tables.len(), "template parsed");
        Ok(Template {
            tables,
            rendered,
            seed: None,
        })
    }

    pub fn from_base64(encoded: &str, params: &Variables) -> Result<Template, TemplateError> {
        Template::from_text(&decode_base64(encoded)?, params)
    }

    pub fn from_file(path: &Path, params: &Variables) -> Result<Template, TemplateError> {
        let text = read_template(path)?;
        Template::from_text_with(&TemplateRenderer::new(), &text, params, path.parent())
    }

    /// Look `name` up in `dir`; see [`resolve_named`].
    pub fn from_named(
        dir: &Path,
        name: &str,
        params: &Variables,
    ) -> Result<Template, TemplateError> {
        Template::from_file(&resolve_named(dir, name), params)
    }

    /// Render without parsing tables.
    pub fn render(text: &str, params: &Variables) -> Result<Rendered, TemplateError> {
        Ok(TemplateRenderer::new().render(text, params)?)
    }

    pub fn render_file(path: &Path, params: &Variables) -> Result<Rendered, TemplateError> {
        Template::render(&read_template(path)?, params)
    }

    /// Seed every table's random source, making stochastic columns reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn rendered(&self) -> &Rendered {
        &self.rendered
    }

    pub fn variables(&self) -> &Variables {
        &self.rendered.variables
    }

    /// Generate every table in order without loading targets.
    pub fn generate(&self) -> RunReport {
        self.process("generate", |table, rng| table.generate(rng))
    }

    /// Generate and load every table in order. A failed table does not stop
    /// the ones after it.
    pub fn run(&self) -> RunReport {
        self.process("run", |table, rng| table.run(rng))
    }

    fn process<F>(&self, mode: &str, step: F) -> RunReport
    where
        F: Fn(&Table, &mut ChaCha8Rng) -> Result<GeneratedTable, TableError>,
    {
        let started = Instant::now();
        let run_id = uuid::Uuid::new_v4().to_string();
        let mut report = RunReport::new(run_id.clone());
        info!(run_id = %run_id, mode, tables = self.tables.len(), seed = ?self.seed, "run started");

        for table in &self.tables {
            let mut rng = self.table_rng(&table.name);
            let result = step(table, &mut rng);
            if let Err(err) = &result {
                warn!(run_id = %run_id, table = %table.name, error = %err, "table failed");
            }
            report.outcomes.push(TableOutcome {
                table: table.name.clone(),
                result,
            });
        }

        report.duration_ms = started.elapsed().as_millis() as u64;
        info!(
            run_id = %run_id,
            tables = report.outcomes.len(),
            failed = report.failed().count(),
            duration_ms = report.duration_ms,
            "run completed"
        );
        report
    }

    fn table_rng(&self, table: &str) -> ChaCha8Rng {
        match self.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(hash_seed(seed, table)),
            None => ChaCha8Rng::from_rng(&mut rand::rng()),
        }
    }
}

fn parse_tables(text: &str, base: Option<&Path>) -> Result<Vec<Table>, TemplateError> {
    let document: YamlValue = serde_yaml::from_str(text)?;
    let Some(mapping) = document.as_mapping() else {
        return Err(TemplateError::Document("expected a mapping at the top level".into()));
    };
    for key in mapping.keys() {
        if !matches!(key.as_str(), Some("variables" | "tables")) {
            return Err(TemplateError::Document(format!("unexpected top-level key {key:?}")));
        }
    }
    match mapping.get("tables") {
        Some(YamlValue::Sequence(items)) => items
            .iter()
            .map(|item| Table::parse(item, base).map_err(TemplateError::from))
            .collect(),
        Some(_) => Err(TemplateError::Document("'tables' must be a list".into())),
        None => Err(TemplateError::Document("missing 'tables'".into())),
    }
}

fn decode_base64(encoded: &str) -> Result<String, TemplateError> {
    let compact: String = encoded.chars().filter(|ch| !ch.is_whitespace()).collect();
    let bytes = STANDARD.decode(compact)?;
    Ok(String::from_utf8(bytes)?)
}

fn read_template(path: &Path) -> Result<String, TemplateError> {
    std::fs::read_to_string(path).map_err(|source| TemplateError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Path of template `name` under `dir`, trying the `.yaml` and `.yml`
/// extensions when the bare name does not exist.
pub fn resolve_named(dir: &Path, name: &str) -> PathBuf {
    let direct = dir.join(name);
    if direct.is_file() {
        return direct;
    }
    TEMPLATE_EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{name}.{ext}")))
        .find(|candidate| candidate.is_file())
        .unwrap_or(direct)
}

fn hash_seed(seed: u64, key: &str) -> u64 {
    let mut hash = seed ^ 0xcbf29ce484222325;
    for byte in key.as_bytes() {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(0x100000001b3);
    }
    hash
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_seeds_differ_by_name() {
        assert_ne!(hash_seed(1, "users"), hash_seed(1, "orders"));
        assert_eq!(hash_seed(1, "users"), hash_seed(1, "users"));
    }

    #[test]
    fn base64_whitespace_is_ignored() {
        let encoded = STANDARD.encode("tables: []\n");
        let wrapped = format!("{}\n{}", &encoded[..4], &encoded[4..]);
        assert_eq!(decode_base64(&wrapped).unwrap(), "tables: []\n");
    }

    #[test]
    fn top_level_document_is_validated() {
        assert!(matches!(parse_tables("tables: 3", None), Err(TemplateError::Document(_))));
        assert!(matches!(parse_tables("variables: {}", None), Err(TemplateError::Document(_))));
        assert!(matches!(
            parse_tables("tables: []\nextra: 1", None),
            Err(TemplateError::Document(_))
        ));
        assert!(parse_tables("tables: []", None).unwrap().is_empty());
    }

    #[test]
    fn named_templates_resolve_extensions() {
        let dir = std::env::temp_dir().join(format!("fauxdata-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("users.yml"), "tables: []\n").unwrap();
        assert_eq!(resolve_named(&dir, "users"), dir.join("users.yml"));
        assert_eq!(resolve_named(&dir, "users.yml"), dir.join("users.yml"));
        std::fs::remove_dir_all(&dir).ok();
    }
}
