//! Input resolution for the command line: paths and globs, NDJSON splitting,
//! JSON Pointer selection and jq pre-processing.
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::Args;
use jaq_core::{load, Compiler, Ctx, RcIter};
use jaq_json::Val;

#[derive(Args, Debug, Clone)]
pub struct InputSettings {
    /// treat input as newline-delimited JSON (NDJSON)
    #[arg(long, default_value_t = false)]
    pub ndjson: bool,

    /// JSON Pointer to select a subnode in each document (e.g. /data/items/0)
    #[arg(long)]
    pub json_pointer: Option<String>,

    /// jq filter applied to each document; every output is checked on its own
    #[arg(long)]
    pub jq_expr: Option<String>,

    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    pub input: Vec<String>,
}

/// One JSON document ready for decoding.
#[derive(Debug, Clone)]
pub struct Document {
    /// `path`, `path:line` for NDJSON, with `#n` appended per jq output.
    pub label: String,
    pub bytes: Vec<u8>,
}

impl InputSettings {
    pub fn resolve_paths(&self) -> Result<Vec<PathBuf>> {
        resolve_file_path_patterns(&self.input)
    }

    /// Every document contained in `path`, after selection and filtering.
    pub fn load_file(&self, path: &Path) -> Result<Vec<Document>> {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read source file {}", path.display()))?;
        let label = path.display().to_string();
        let raw: Vec<(String, &str)> = if self.ndjson {
            source
                .lines()
                .enumerate()
                .filter(|(_, line)| !line.trim().is_empty())
                .map(|(n, line)| (format!("{label}:{}", n + 1), line))
                .collect()
        } else {
            vec![(label, source.as_str())]
        };

        let mut out = Vec::new();
        for (label, text) in raw {
            self.preprocess(label, text, &mut out)?;
        }
        Ok(out)
    }

    fn preprocess(&self, label: String, text: &str, out: &mut Vec<Document>) -> Result<()> {
        if self.json_pointer.is_none() && self.jq_expr.is_none() {
            // untouched bytes keep the probe in charge of number kinds
            out.push(Document { label, bytes: text.as_bytes().to_vec() });
            return Ok(());
        }
        let mut value = serde_json::from_str::<serde_json::Value>(text)
            .with_context(|| format!("failed to parse JSON ({label})"))?;
        if let Some(pointer) = self.json_pointer.as_deref() {
            value = value
                .pointer(pointer)
                .cloned()
                .ok_or_else(|| anyhow!("JSON pointer {pointer} selects nothing ({label})"))?;
        }
        match self.jq_expr.as_deref() {
            None => out.push(Document { label, bytes: serde_json::to_vec(&value)? }),
            Some(jq_expr) => {
                let results = run_jaq(jq_expr, &value)
                    .with_context(|| format!("failed to apply jq expression ({label})"))?;
                for (n, text) in results.into_iter().enumerate() {
                    out.push(Document { label: format!("{label}#{n}"), bytes: text.into_bytes() });
                }
            }
        }
        Ok(())
    }
}

/// Run a jq filter and return each output as JSON text.
pub fn run_jaq(filter_src: &str, input: &serde_json::Value) -> Result<Vec<String>> {
    let loader = load::Loader::new(jaq_std::defs().chain(jaq_json::defs()));
    let arena = load::Arena::default();
    let program = load::File { code: filter_src, path: () };

    let modules = loader.load(&arena, program).map_err(|errs| {
        compile_failure(
            errs.iter()
                .map(|(file, err)| format!("parse error: {err:?} in `{}`", file.code)),
        )
    })?;
    let filter = Compiler::default()
        .with_funs(jaq_std::funs().chain(jaq_json::funs()))
        .compile(modules)
        .map_err(|errs| {
            compile_failure(errs.iter().flat_map(|(file, list)| {
                list.iter().map(move |(name, undef)| {
                    format!("undefined `{name}`: {undef:?} in `{}`", file.code)
                })
            }))
        })?;

    let inputs = RcIter::new(core::iter::empty());
    filter
        .run((Ctx::new([], &inputs), Val::from(input.clone())))
        .map(|item| item.map(|v| v.to_string()).map_err(|e| anyhow!("jq runtime error: {e:?}")))
        .collect()
}

fn compile_failure(lines: impl Iterator<Item = String>) -> anyhow::Error {
    anyhow!(lines.collect::<Vec<_>>().join("\n"))
}

fn resolve_file_path_patterns<I>(patterns: I) -> Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();
    for raw in patterns {
        let pattern = raw.as_ref();
        if has_glob_chars(pattern) {
            let before = out.len();
            for entry in glob::glob(pattern)? {
                out.push(entry?);
            }
            if out.len() == before {
                return Err(anyhow!("glob pattern matched no files: {pattern}"));
            }
        } else {
            out.push(PathBuf::from(pattern));
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn settings(ndjson: bool, json_pointer: Option<&str>, jq_expr: Option<&str>) -> InputSettings {
        InputSettings {
            ndjson,
            json_pointer: json_pointer.map(str::to_owned),
            jq_expr: jq_expr.map(str::to_owned),
            input: Vec::new(),
        }
    }

    #[test]
    fn jaq_outputs_each_result() {
        let out = run_jaq(".items[]", &json!({"items": [1, {"a": 2}]})).unwrap();
        let values: Vec<serde_json::Value> =
            out.iter().map(|s| serde_json::from_str(s).unwrap()).collect();
        assert_eq!(values, vec![json!(1), json!({"a": 2})]);
    }

    #[test]
    fn unknown_jq_function_fails_to_compile() {
        let err = run_jaq("no_such_filter", &json!(null)).unwrap_err();
        assert!(err.to_string().contains("undefined `no_such_filter`"), "{err}");
    }

    #[test]
    fn pointer_selects_subnode() {
        let mut out = Vec::new();
        settings(false, Some("/data/0"), None)
            .preprocess("doc".into(), r#"{"data":[{"type":"answer"}]}"#, &mut out)
            .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].bytes, br#"{"type":"answer"}"#.to_vec());
    }

    #[test]
    fn missing_pointer_target_is_an_error() {
        let mut out = Vec::new();
        let err = settings(false, Some("/nope"), None).preprocess("doc".into(), "{}", &mut out);
        assert!(err.is_err());
    }

    #[test]
    fn plain_documents_pass_through_unchanged() {
        let mut out = Vec::new();
        settings(true, None, None).preprocess("f:1".into(), "{\"v\": 1.0}", &mut out).unwrap();
        assert_eq!(out[0].bytes, b"{\"v\": 1.0}".to_vec());
    }

    #[test]
    fn unmatched_glob_is_an_error() {
        assert!(resolve_file_path_patterns(["/definitely/not/here/*.json"]).is_err());
        let literal = resolve_file_path_patterns(["plain.json"]).unwrap();
        assert_eq!(literal, vec![PathBuf::from("plain.json")]);
    }
}
