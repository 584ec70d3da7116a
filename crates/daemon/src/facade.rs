//! Uniform entry point from a request to the engine.
//!
//! [`execute`] runs one request against the engine and contains every
//! failure: engine errors and panics are logged with the request kind and
//! position and become `None`, so one bad file never takes the worker down.

use std::panic::{AssertUnwindSafe, catch_unwind};

use pyhint_worker::panic_payload_message;
use rustc_hash::FxHashSet as HashSet;
use tracing::{debug, error};

use crate::engine::{AnalysisEngine, CallSignature, EngineResult, ParamKind, SOURCE_ENCODING, Script, ScriptRequest};
use crate::env::ResolvedEnvironment;
use crate::request::{Answer, Request, RequestContext};
use crate::types::CompletionEntry;

/// Marker the engine uses for "remaining overloads differ".
const ELLIPSIS: &str = "...";

/// A parameter prepared for completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamHint {
	pub name: String,
	/// Default value text; only kept when keyword parameters are requested.
	pub default: Option<String>,
}

impl ParamHint {
	pub fn new(name: impl Into<String>, default: Option<&str>) -> Self {
		Self {
			name: name.into(),
			default: default.map(str::to_string),
		}
	}
}

/// Runs `ctx` against the engine. Never panics and never returns an error.
pub fn execute(engine: &dyn AnalysisEngine, env: &ResolvedEnvironment, ctx: &RequestContext) -> Option<Answer> {
	let kind = ctx.kind().as_str();
	match catch_unwind(AssertUnwindSafe(|| run(engine, env, ctx))) {
		Ok(Ok(answer)) => {
			debug!(kind, answer = ?answer, "engine answer");
			Some(answer)
		}
		Ok(Err(err)) => {
			error!(kind, path = ?ctx.path, line = ctx.line, column = ctx.column, error = %err, "engine request failed");
			None
		}
		Err(payload) => {
			error!(
				kind,
				path = ?ctx.path,
				line = ctx.line,
				column = ctx.column,
				panic = %panic_payload_message(payload.as_ref()),
				"engine request panicked"
			);
			None
		}
	}
}

fn run(engine: &dyn AnalysisEngine, env: &ResolvedEnvironment, ctx: &RequestContext) -> EngineResult<Answer> {
	let script = engine.analyze(ScriptRequest {
		source: &ctx.source,
		line: ctx.line + 1,
		column: ctx.column,
		path: ctx.path.as_deref(),
		encoding: SOURCE_ENCODING,
		environment: &env.environment,
		search_paths: &env.search_paths,
	})?;

	match ctx.request {
		Request::Autocomplete { fuzzy } => {
			let mut entries = call_parameter_entries(script.as_ref(), true, true)?;
			entries.extend(
				script
					.completions(fuzzy)?
					.into_iter()
					.map(|c| CompletionEntry::new(format!("{}\t{}", c.name, c.kind), c.name)),
			);
			Ok(Answer::Completions(dedup_by_insert_text(entries)))
		}
		Request::FuncArgs { complete_all } => {
			let entries = call_parameter_entries(script.as_ref(), complete_all, complete_all)?;
			let template = entries.iter().map(|e| e.insert_text.as_str()).collect::<Vec<_>>().join(", ");
			Ok(Answer::Template(template))
		}
	}
}

/// Snippet completions for the innermost call's parameters.
///
/// Placeholders are numbered from 1 in parameter order; a defaulted parameter
/// becomes `name=${i:default}` when `with_values` is set, otherwise `${i:name}`.
fn call_parameter_entries(script: &dyn Script, with_keywords: bool, with_values: bool) -> EngineResult<Vec<CompletionEntry>> {
	let Some(signature) = script.call_signatures()?.into_iter().next() else {
		return Ok(Vec::new());
	};

	let entries = function_parameters(&signature, with_keywords)
		.into_iter()
		.enumerate()
		.map(|(index, hint)| {
			let label = format!("{}\tparam", hint.name);
			let insert = match hint.default {
				Some(value) if with_values => format!("{}=${{{}:{}}}", hint.name, index + 1, value),
				_ => format!("${{{}:{}}}", index + 1, hint.name),
			};
			CompletionEntry::new(label, insert)
		})
		.collect();
	Ok(entries)
}

/// Extracts completable parameters from a signature.
///
/// The receiver, `*args` and `**kwargs` are skipped. Without keywords,
/// defaulted parameters are skipped and collection stops at the first `...`.
pub fn function_parameters(signature: &CallSignature, with_keywords: bool) -> Vec<ParamHint> {
	let mut params = Vec::new();

	for param in &signature.params {
		if !with_keywords && param.name == ELLIPSIS {
			break;
		}
		if param.name.is_empty()
			|| param.name == "self"
			|| param.name == ELLIPSIS
			|| matches!(param.kind, ParamKind::VarPositional | ParamKind::VarKeyword)
		{
			continue;
		}

		match &param.default {
			Some(value) if with_keywords => params.push(ParamHint::new(&param.name, Some(value.trim_start()))),
			Some(_) => continue,
			None => params.push(ParamHint::new(&param.name, None)),
		}
	}

	params
}

/// Drops entries whose insertion text was already seen, keeping first occurrences.
pub fn dedup_by_insert_text(entries: Vec<CompletionEntry>) -> Vec<CompletionEntry> {
	let mut seen = HashSet::with_capacity_and_hasher(entries.len(), Default::default());
	entries.into_iter().filter(|e| seen.insert(e.insert_text.clone())).collect()
}
