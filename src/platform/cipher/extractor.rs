//! Static extraction of the signature cipher from a player script
//!
//! The player script is never executed. Each stage below locates one piece of
//! the decipher routine with an ordered list of heuristics; the first match
//! wins and the stage only fails once every heuristic has missed. The result
//! is a closed list of [`Operation`]s that the interpreter can replay.

use super::operation::{self, Operation};
use crate::error::{ExtractionError, ExtractionStage};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

/// Call sites that hand a signature value straight to the decipher function
static SIGNATURE_CALL_SITES: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r#"\b[a-zA-Z0-9$]+&&\([a-zA-Z0-9$]+=(?P<name>[a-zA-Z0-9$]+)\(decodeURIComponent\("#).unwrap(),
        Regex::new(r#"\b[a-zA-Z0-9$]+\s*&&\s*[a-zA-Z0-9$]+\.set\([^,]+\s*,\s*encodeURIComponent\s*\(\s*(?P<name>[a-zA-Z0-9$]+)\("#).unwrap(),
        Regex::new(r#"["']signature["']\s*,\s*(?:encodeURIComponent\s*\(\s*)?(?P<name>[a-zA-Z0-9$]+)\("#).unwrap(),
        Regex::new(r#"\.sig\|\|(?P<name>[a-zA-Z0-9$]+)\("#).unwrap(),
    ]
});

/// `name=function(a){a=a.split("")...`
static SPLIT_FUNCTION_ASSIGNMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?:^|[^a-zA-Z0-9$.])(?P<name>[a-zA-Z0-9$]+)\s*=\s*function\s*\(\s*[a-zA-Z0-9$]+\s*\)\s*\{\s*[a-zA-Z0-9$]+\s*=\s*[a-zA-Z0-9$]+\.split\(\s*""\s*\)"#).unwrap()
});

/// `function name(a){...split("")...join("")`
static SPLIT_JOIN_DECLARATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"function\s+(?P<name>[a-zA-Z0-9$]+)\s*\(\s*[a-zA-Z0-9$]+\s*\)\s*\{[^}]*\.split\(\s*""\s*\)[^}]*\.join\(\s*""\s*\)"#).unwrap()
});

static STATEMENT_MEMBER_ACCESS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#";\s*(?P<helper>[a-zA-Z0-9$]+)\."#).unwrap());

static OBJECT_LITERAL_DECLARATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?:var|let|const)\s+(?P<name>[a-zA-Z0-9$]+)\s*=\s*\{"#).unwrap()
});

static FUNCTION_MEMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"["']?(?P<name>[a-zA-Z0-9$]+)["']?\s*:\s*function\s*\((?P<params>[^)]*)\)\s*\{"#)
        .unwrap()
});

static REVERSE_CALL: Lazy<Regex> = Lazy::new(|| Regex::new(r#"\.reverse\(\s*\)"#).unwrap());

/// Built-ins that wrap the decipher call at some call sites
const URI_BUILTINS: [&str; 2] = ["encodeURIComponent", "decodeURIComponent"];

/// Array methods a helper object is expected to wrap
const HELPER_METHOD_HINTS: [&str; 5] = ["reverse", "splice", "slice", "shift", "push"];

/// Which heuristic won at one extraction stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraceStep {
    pub stage: ExtractionStage,
    pub heuristic: &'static str,
    pub index: usize,
}

/// Record of the heuristics that produced an algorithm
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractionTrace {
    pub steps: Vec<TraceStep>,
}

impl ExtractionTrace {
    fn record(&mut self, stage: ExtractionStage, heuristic: &'static str, index: usize) {
        self.steps.push(TraceStep {
            stage,
            heuristic,
            index,
        });
    }

    /// The heuristic that matched at `stage`, if the stage ran
    pub fn matched(&self, stage: ExtractionStage) -> Option<&TraceStep> {
        self.steps.iter().find(|step| step.stage == stage)
    }
}

/// The cipher of one player script as an ordered list of primitive steps.
///
/// The default value has no operations and leaves signatures untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractedAlgorithm {
    /// Steps in the order the decipher function performs them
    pub operations: Vec<Operation>,
    /// Identity of the originating script (player id or URL)
    pub script_id: Option<String>,
    pub trace: ExtractionTrace,
}

impl ExtractedAlgorithm {
    /// Decipher one obfuscated signature
    pub fn apply(&self, signature: &str) -> String {
        operation::apply(signature, &self.operations)
    }

    pub fn with_script_id(mut self, script_id: impl Into<String>) -> Self {
        self.script_id = Some(script_id.into());
        self
    }

    /// Whether two extractions describe the same transformation
    pub fn same_operations(&self, other: &ExtractedAlgorithm) -> bool {
        self.operations == other.operations
    }
}

/// Kind of primitive a helper method implements
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PrimitiveKind {
    Reverse,
    Drop,
    SwapFirstWith,
}

impl PrimitiveKind {
    fn with_arg(self, arg: usize) -> Operation {
        match self {
            PrimitiveKind::Reverse => Operation::Reverse,
            PrimitiveKind::Drop => Operation::Drop(arg),
            PrimitiveKind::SwapFirstWith => Operation::SwapFirstWith(arg),
        }
    }
}

struct DecipherFunction<'a> {
    param: &'a str,
    body: &'a str,
}

type Heuristic<'a, T> = (&'static str, &'a dyn Fn() -> Option<T>);

/// Try `heuristics` in order; the first hit ends the stage
fn run_stage<T>(
    trace: &mut ExtractionTrace,
    stage: ExtractionStage,
    heuristics: &[Heuristic<'_, T>],
) -> Result<T, ExtractionError> {
    let mut attempted = Vec::with_capacity(heuristics.len());
    for (index, &(name, heuristic)) in heuristics.iter().enumerate() {
        attempted.push(name);
        if let Some(found) = heuristic() {
            debug!(%stage, heuristic = name, index, "extraction heuristic matched");
            trace.record(stage, name, index);
            return Ok(found);
        }
        debug!(%stage, heuristic = name, "extraction heuristic missed");
    }
    Err(ExtractionError::new(stage, attempted))
}

/// Reduce a player script to the operation sequence of its signature cipher
pub fn extract(script: &str) -> Result<ExtractedAlgorithm, ExtractionError> {
    debug!("Extracting cipher from player script ({} chars)", script.len());
    let mut trace = ExtractionTrace::default();

    let function_name: &str = run_stage(
        &mut trace,
        ExtractionStage::FunctionName,
        &[
            ("signature-call-site", &|| find_call_site(script)),
            ("split-function-assignment", &|| {
                capture_name(&SPLIT_FUNCTION_ASSIGNMENT, script)
            }),
            ("split-join-declaration", &|| {
                capture_name(&SPLIT_JOIN_DECLARATION, script)
            }),
        ],
    )?;
    debug!("Decipher function: {}", function_name);

    let escaped_name = regex::escape(function_name);
    let function: DecipherFunction<'_> = run_stage(
        &mut trace,
        ExtractionStage::FunctionBody,
        &[
            ("function-declaration", &|| {
                find_function(
                    script,
                    &format!(
                        r#"function\s+{}\s*\(\s*(?P<param>[a-zA-Z0-9$]+)\s*\)\s*\{{"#,
                        escaped_name
                    ),
                )
            }),
            ("function-expression", &|| {
                find_function(
                    script,
                    &format!(
                        r#"(?:^|[^a-zA-Z0-9$.]){}\s*=\s*function\s*\(\s*(?P<param>[a-zA-Z0-9$]+)\s*\)\s*\{{"#,
                        escaped_name
                    ),
                )
            }),
        ],
    )?;

    let helper_name: &str = run_stage(
        &mut trace,
        ExtractionStage::HelperName,
        &[
            ("statement-member-access", &|| {
                STATEMENT_MEMBER_ACCESS
                    .captures_iter(function.body)
                    .filter_map(|caps| caps.name("helper"))
                    .map(|m| m.as_str())
                    .find(|name| *name != function.param)
            }),
            ("call-with-working-variable", &|| {
                let pattern = format!(
                    r#"(?P<helper>[a-zA-Z0-9$]+)\.[a-zA-Z0-9$]+\(\s*{}\s*(?:,\s*\d+\s*)?\)"#,
                    regex::escape(function.param)
                );
                capture_group(&pattern, function.body, "helper")
            }),
        ],
    )?;
    debug!("Helper object: {}", helper_name);

    let escaped_helper = regex::escape(helper_name);
    let helper_body: &str = run_stage(
        &mut trace,
        ExtractionStage::HelperBody,
        &[
            ("exact-name-declaration", &|| {
                find_object_literal(
                    script,
                    &format!(
                        r#"(?:var|let|const)\s+{}\s*=\s*\{{"#,
                        escaped_helper
                    ),
                )
            }),
            ("method-name-scan", &|| scan_helper_literals(script)),
            ("exact-name-assignment", &|| {
                find_object_literal(script, &format!(r#"[;,]{}=\{{"#, escaped_helper))
            }),
        ],
    )?;

    if !FUNCTION_MEMBER.is_match(helper_body) {
        return Err(ExtractionError::new(
            ExtractionStage::HelperInvalid,
            vec!["function-valued-member"],
        ));
    }

    let methods = classify_helper_methods(helper_body);
    if methods.is_empty() {
        return Err(ExtractionError::new(
            ExtractionStage::HelperMethods,
            vec!["reverse-call", "temp-variable-swap", "splice-drop"],
        ));
    }
    debug!("Classified {} helper methods", methods.len());

    let operations = translate_body(&function, helper_name, &methods)?;
    debug!(
        "Extracted {} cipher operations: {:?}",
        operations.len(),
        operations
    );

    Ok(ExtractedAlgorithm {
        operations,
        script_id: None,
        trace,
    })
}

fn find_call_site(script: &str) -> Option<&str> {
    SIGNATURE_CALL_SITES.iter().find_map(|regex| {
        regex
            .captures_iter(script)
            .filter_map(|caps| caps.name("name"))
            .map(|m| m.as_str())
            .find(|name| !URI_BUILTINS.contains(name))
    })
}

fn capture_name<'s>(regex: &Regex, text: &'s str) -> Option<&'s str> {
    regex
        .captures(text)
        .and_then(|caps| caps.name("name"))
        .map(|m| m.as_str())
}

fn capture_group<'s>(pattern: &str, text: &'s str, group: &str) -> Option<&'s str> {
    Regex::new(pattern)
        .ok()?
        .captures(text)
        .and_then(|caps| caps.name(group))
        .map(|m| m.as_str())
}

/// Match a function header ending in `{` and capture its parameter and body
fn find_function<'s>(script: &'s str, header: &str) -> Option<DecipherFunction<'s>> {
    let regex = Regex::new(header).ok()?;
    let caps = regex.captures(script)?;
    let param = caps.name("param")?.as_str();
    let open = caps.get(0)?.end() - 1;
    let body = balanced_block(script, open)?;
    Some(DecipherFunction { param, body })
}

/// Match an object-literal header ending in `{` and capture the literal body
fn find_object_literal<'s>(script: &'s str, header: &str) -> Option<&'s str> {
    let regex = Regex::new(header).ok()?;
    let found = regex.find(script)?;
    balanced_block(script, found.end() - 1)
}

/// First declared object literal that calls one of the usual array methods.
///
/// Covers helpers whose declared name differs from the one used at the call
/// sites.
fn scan_helper_literals(script: &str) -> Option<&str> {
    OBJECT_LITERAL_DECLARATION
        .captures_iter(script)
        .filter_map(|caps| {
            let open = caps.get(0)?.end() - 1;
            balanced_block(script, open)
        })
        .find(|body| {
            HELPER_METHOD_HINTS
                .iter()
                .any(|method| body.contains(&format!(".{}(", method)))
        })
}

/// Text strictly inside the brace at `open` and its matching close brace.
///
/// Braces inside string literals are skipped.
fn balanced_block(text: &str, open: usize) -> Option<&str> {
    let bytes = text.as_bytes();
    if bytes.get(open) != Some(&b'{') {
        return None;
    }

    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut escaped = false;
    for (i, &b) in bytes.iter().enumerate().skip(open) {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == q {
                quote = None;
            }
            continue;
        }
        match b {
            b'"' | b'\'' | b'`' => quote = Some(b),
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[open + 1..i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Map each function-valued member of the helper literal to its primitive
fn classify_helper_methods(helper_body: &str) -> HashMap<String, PrimitiveKind> {
    let mut methods = HashMap::new();
    for caps in FUNCTION_MEMBER.captures_iter(helper_body) {
        let (Some(name), Some(params), Some(whole)) =
            (caps.name("name"), caps.name("params"), caps.get(0))
        else {
            continue;
        };
        let Some(body) = balanced_block(helper_body, whole.end() - 1) else {
            continue;
        };
        let params: Vec<&str> = params
            .as_str()
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();

        match classify_method(&params, body) {
            Some(kind) => {
                debug!("Helper method {} -> {:?}", name.as_str(), kind);
                methods.insert(name.as_str().to_string(), kind);
            }
            None => debug!("Helper method {} not recognised", name.as_str()),
        }
    }
    methods
}

fn classify_method(params: &[&str], body: &str) -> Option<PrimitiveKind> {
    let array = regex::escape(params.first()?);

    if REVERSE_CALL.is_match(body) && !body.contains('[') {
        return Some(PrimitiveKind::Reverse);
    }

    let count = regex::escape(params.get(1)?);
    let saves_first = Regex::new(&format!(
        r#"var\s+[a-zA-Z0-9$]+\s*=\s*{}\[0\]"#,
        array
    ))
    .ok()?;
    let overwrites_first = Regex::new(&format!(
        r#"{a}\[0\]\s*=\s*{a}\[{b}"#,
        a = array,
        b = count
    ))
    .ok()?;
    if saves_first.is_match(body) && overwrites_first.is_match(body) {
        return Some(PrimitiveKind::SwapFirstWith);
    }

    let removes_prefix = Regex::new(&format!(
        r#"{a}\.(?:splice\(\s*0\s*,\s*{b}|slice\(\s*{b})\s*\)"#,
        a = array,
        b = count
    ))
    .ok()?;
    if removes_prefix.is_match(body) {
        return Some(PrimitiveKind::Drop);
    }

    None
}

/// Turn each `helper.method(param[, n])` statement of the body into an operation.
///
/// Every statement that references the helper must have exactly that shape;
/// anything else fails the stage rather than dropping a step.
fn translate_body(
    function: &DecipherFunction<'_>,
    helper_name: &str,
    methods: &HashMap<String, PrimitiveKind>,
) -> Result<Vec<Operation>, ExtractionError> {
    let translate_error =
        || ExtractionError::new(ExtractionStage::Translate, vec!["helper-call"]);

    let escaped_helper = regex::escape(helper_name);
    let mention = Regex::new(&format!(r#"(?:^|[^a-zA-Z0-9$.]){}\."#, escaped_helper))
        .map_err(|_| translate_error())?;
    let call = Regex::new(&format!(
        r#"^{}\.(?P<method>[a-zA-Z0-9$]+)\(\s*{}\s*(?:,\s*(?P<arg>\d+)\s*)?\)$"#,
        escaped_helper,
        regex::escape(function.param)
    ))
    .map_err(|_| translate_error())?;

    let mut operations = Vec::new();
    for statement in function.body.split(';').map(str::trim) {
        if !mention.is_match(statement) {
            continue;
        }
        let Some(caps) = call.captures(statement) else {
            debug!("Unsupported helper statement: {}", statement);
            return Err(translate_error());
        };
        let method = caps.name("method").map(|m| m.as_str()).unwrap_or_default();
        let Some(kind) = methods.get(method) else {
            debug!("Decipher body calls unclassified helper method {}", method);
            return Err(translate_error());
        };
        let arg = caps
            .name("arg")
            .map(|m| m.as_str().parse::<usize>().unwrap_or(usize::MAX))
            .unwrap_or(0);
        operations.push(kind.with_arg(arg));
    }

    if operations.is_empty() {
        return Err(translate_error());
    }
    Ok(operations)
}
