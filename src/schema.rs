use crate::error::SchemaError;
use crate::parser::DEFAULT_MAX_DEPTH;
use crate::utils::decode_string;
use crate::value::{approx_eq, Map, Value};
use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;

/// Object keywords that are recognised but cannot be evaluated.
const UNSUPPORTED: [&str; 3] = ["patternProperties", "additionalProperties", "dependencies"];

const TYPE_NAMES: [&str; 8] = [
    "object", "array", "string", "number", "boolean", "null", "integer", "any",
];

/// Validator configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorOptions {
    /// Maximum nesting of schema applications; `None` is unbounded.
    pub max_depth: Option<usize>,
    /// Keep evaluating sibling constraints after the first violation so all
    /// of them are reported. The boolean result is the same either way.
    pub collect_all: bool,
}

impl Default for ValidatorOptions {
    fn default() -> Self {
        ValidatorOptions {
            max_depth: Some(DEFAULT_MAX_DEPTH),
            collect_all: true,
        }
    }
}

impl ValidatorOptions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    #[must_use]
    pub fn with_collect_all(mut self, collect_all: bool) -> Self {
        self.collect_all = collect_all;
        self
    }
}

/// One violated constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// JSON pointer to the offending node in the data.
    pub path: String,
    pub keyword: String,
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = if self.path.is_empty() { "(root)" } else { &self.path };
        write!(f, "{path}: {} ({})", self.message, self.keyword)
    }
}

/// Outcome of validating one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Validation {
    valid: bool,
    violations: Vec<Violation>,
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// The first violated constraint in walk order.
    pub fn first(&self) -> Option<&Violation> {
        self.violations.first()
    }
}

/// A reusable validator bound to one schema.
///
/// A schema is an ordinary [`Value`] whose objects use JSON-Schema keyword
/// names; data and schema are walked together depth-first. `check_and_fill`
/// injects `default` values into the caller's document, while `check` works
/// on a private clone. `anyOf`, `oneOf` and `not` branches run against scratch
/// copies and never inject defaults.
#[derive(Debug, Clone)]
pub struct Validator<'s> {
    schema: &'s Value,
    options: ValidatorOptions,
}

impl<'s> Validator<'s> {
    pub fn new(schema: &'s Value) -> Self {
        Validator {
            schema,
            options: ValidatorOptions::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: ValidatorOptions) -> Self {
        self.options = options;
        self
    }

    /// Validates without touching `data`. Defaults are still applied, to a
    /// private copy, so constraints such as `required` see them.
    ///
    /// # Errors
    ///
    /// Returns a `SchemaError` if the schema cannot be evaluated.
    pub fn check(&self, data: &Value) -> Result<Validation, SchemaError> {
        let mut scratch = data.clone();
        self.check_and_fill(&mut scratch)
    }

    /// Validates `data`, injecting schema defaults for absent properties.
    ///
    /// # Errors
    ///
    /// Returns a `SchemaError` if the schema cannot be evaluated.
    pub fn check_and_fill(&self, data: &mut Value) -> Result<Validation, SchemaError> {
        debug!("validating {} document", data.kind_name());
        let mut walker = Walker::new(self.options);
        let valid = walker.walk(data, self.schema, "", "#")?;
        Ok(Validation {
            valid,
            violations: walker.violations,
        })
    }

    /// # Errors
    ///
    /// Returns a `SchemaError` if the schema cannot be evaluated.
    pub fn is_valid(&self, data: &Value) -> Result<bool, SchemaError> {
        Ok(self.check(data)?.is_valid())
    }
}

/// Returns whether `data` conforms to `schema`. `data` is never modified.
///
/// # Errors
///
/// Returns a `SchemaError` if the schema uses an unsupported keyword or is
/// malformed. A non-conforming document is `Ok(false)`, not an error.
pub fn validate(data: &Value, schema: &Value) -> Result<bool, SchemaError> {
    Validator::new(schema).is_valid(data)
}

/// Like [`validate`], but absent properties whose schema carries a `default`
/// are inserted into `data` before they are checked.
///
/// # Errors
///
/// Returns a `SchemaError` if the schema cannot be evaluated.
pub fn validate_and_fill(data: &mut Value, schema: &Value) -> Result<bool, SchemaError> {
    Ok(Validator::new(schema).check_and_fill(data)?.is_valid())
}

/// Records a failed constraint and stops the current schema level unless all
/// violations are being collected.
macro_rules! check {
    ($walker:ident, $ok:ident, $passed:expr) => {
        if !$passed {
            $ok = false;
            if !$walker.options.collect_all {
                return Ok(false);
            }
        }
    };
}

struct Walker<'s> {
    options: ValidatorOptions,
    patterns: HashMap<&'s str, Regex>,
    violations: Vec<Violation>,
    depth: usize,
}

impl<'s> Walker<'s> {
    fn new(options: ValidatorOptions) -> Self {
        Walker {
            options,
            patterns: HashMap::new(),
            violations: Vec::new(),
            depth: 0,
        }
    }

    fn fail(&mut self, path: &str, keyword: &str, message: impl Into<String>) -> bool {
        self.violations.push(Violation {
            path: path.to_string(),
            keyword: keyword.to_string(),
            message: message.into(),
        });
        false
    }

    fn walk(
        &mut self,
        data: &mut Value,
        schema: &'s Value,
        path: &str,
        sp: &str,
    ) -> Result<bool, SchemaError> {
        let Value::Object(rules) = schema else {
            return Err(SchemaError::invalid(
                "schema",
                sp,
                format!("expected an object, found {}", schema.kind_name()),
            ));
        };
        if let Some(limit) = self.options.max_depth {
            if self.depth >= limit {
                return Err(SchemaError::DepthExceeded {
                    limit,
                    path: path.to_string(),
                });
            }
        }

        self.depth += 1;
        let result = self.walk_rules(data, rules, path, sp);
        self.depth -= 1;
        result
    }

    /// Branch evaluation that neither records violations nor touches `data`.
    fn probe(
        &mut self,
        data: &Value,
        schema: &'s Value,
        path: &str,
        sp: &str,
    ) -> Result<bool, SchemaError> {
        let saved = std::mem::take(&mut self.violations);
        let mut scratch = data.clone();
        let result = self.walk(&mut scratch, schema, path, sp);
        self.violations = saved;
        result
    }

    fn walk_rules(
        &mut self,
        data: &mut Value,
        rules: &'s Map,
        path: &str,
        sp: &str,
    ) -> Result<bool, SchemaError> {
        let mut ok = true;
        if let Some(spec) = rules.get("enum") {
            check!(self, ok, self.check_enum(data, spec, path, sp)?);
        }
        if let Some(spec) = rules.get("type") {
            check!(self, ok, self.check_type(data, spec, path, sp)?);
        }
        if let Some(spec) = rules.get("allOf") {
            check!(self, ok, self.check_all_of(data, spec, path, sp)?);
        }
        if let Some(spec) = rules.get("anyOf") {
            check!(self, ok, self.check_any_of(data, spec, path, sp)?);
        }
        if let Some(spec) = rules.get("oneOf") {
            check!(self, ok, self.check_one_of(data, spec, path, sp)?);
        }
        if let Some(spec) = rules.get("not") {
            check!(self, ok, self.check_not(data, spec, path, sp)?);
        }
        if !ok {
            return Ok(false);
        }

        match data {
            Value::Object(members) => self.check_object(members, rules, path, sp),
            Value::Array(items) => self.check_array(items, rules, path, sp),
            Value::String(s) => self.check_string(s, rules, path, sp),
            Value::Number(n) => self.check_number(*n, rules, path, sp),
            Value::Boolean(_) | Value::Null => Ok(true),
        }
    }

    fn check_enum(
        &mut self,
        data: &Value,
        spec: &'s Value,
        path: &str,
        sp: &str,
    ) -> Result<bool, SchemaError> {
        let Value::Array(options) = spec else {
            return Err(SchemaError::invalid("enum", sp, "expected an array"));
        };
        if options.iter().any(|option| option == data) {
            return Ok(true);
        }
        Ok(self.fail(
            path,
            "enum",
            format!("{} is not one of the enumerated values", describe(data)),
        ))
    }

    fn check_type(
        &mut self,
        data: &Value,
        spec: &'s Value,
        path: &str,
        sp: &str,
    ) -> Result<bool, SchemaError> {
        let names: Vec<&str> = match spec {
            Value::String(name) => vec![name.as_str()],
            Value::Array(items) => items
                .iter()
                .map(|item| {
                    item.as_str().ok_or_else(|| {
                        SchemaError::invalid("type", sp, "expected an array of type names")
                    })
                })
                .collect::<Result<_, _>>()?,
            _ => {
                return Err(SchemaError::invalid(
                    "type",
                    sp,
                    "expected a type name or an array of type names",
                ))
            }
        };
        if let Some(unknown) = names.iter().find(|name| !TYPE_NAMES.contains(*name)) {
            return Err(SchemaError::invalid(
                "type",
                sp,
                format!("unknown type name `{unknown}`"),
            ));
        }

        if names.iter().any(|name| type_matches(data, name)) {
            return Ok(true);
        }
        Ok(self.fail(
            path,
            "type",
            format!("expected {}, found {}", names.join(" or "), data.kind_name()),
        ))
    }

    fn check_all_of(
        &mut self,
        data: &mut Value,
        spec: &'s Value,
        path: &str,
        sp: &str,
    ) -> Result<bool, SchemaError> {
        let branches = schema_list("allOf", spec, sp)?;
        let mut ok = true;
        for (i, branch) in branches.iter().enumerate() {
            if !self.walk(data, branch, path, &format!("{sp}/allOf/{i}"))? {
                ok = false;
                if !self.options.collect_all {
                    break;
                }
            }
        }
        Ok(ok || self.fail(path, "allOf", "does not match every allOf schema"))
    }

    fn check_any_of(
        &mut self,
        data: &Value,
        spec: &'s Value,
        path: &str,
        sp: &str,
    ) -> Result<bool, SchemaError> {
        let branches = schema_list("anyOf", spec, sp)?;
        for (i, branch) in branches.iter().enumerate() {
            if self.probe(data, branch, path, &format!("{sp}/anyOf/{i}"))? {
                return Ok(true);
            }
        }
        Ok(self.fail(path, "anyOf", "matches none of the anyOf schemas"))
    }

    fn check_one_of(
        &mut self,
        data: &Value,
        spec: &'s Value,
        path: &str,
        sp: &str,
    ) -> Result<bool, SchemaError> {
        let branches = schema_list("oneOf", spec, sp)?;
        let mut matched = 0;
        for (i, branch) in branches.iter().enumerate() {
            if self.probe(data, branch, path, &format!("{sp}/oneOf/{i}"))? {
                matched += 1;
                if matched > 1 {
                    break;
                }
            }
        }
        match matched {
            1 => Ok(true),
            0 => Ok(self.fail(path, "oneOf", "matches none of the oneOf schemas")),
            _ => Ok(self.fail(path, "oneOf", "matches more than one oneOf schema")),
        }
    }

    fn check_not(
        &mut self,
        data: &Value,
        spec: &'s Value,
        path: &str,
        sp: &str,
    ) -> Result<bool, SchemaError> {
        let branches = schema_list("not", spec, sp)?;
        for (i, branch) in branches.iter().enumerate() {
            if self.probe(data, branch, path, &format!("{sp}/not/{i}"))? {
                return Ok(self.fail(path, "not", format!("matches schema {i} listed under not")));
            }
        }
        Ok(true)
    }

    fn check_object(
        &mut self,
        members: &mut Map,
        rules: &'s Map,
        path: &str,
        sp: &str,
    ) -> Result<bool, SchemaError> {
        if let Some(keyword) = UNSUPPORTED.iter().find(|k| rules.contains_key(**k)) {
            return Err(SchemaError::Unsupported {
                keyword: keyword.to_string(),
                path: sp.to_string(),
            });
        }
        let mut ok = true;

        if let Some(spec) = rules.get("properties") {
            let Value::Object(properties) = spec else {
                return Err(SchemaError::invalid("properties", sp, "expected an object"));
            };
            for (key, sub) in properties {
                let child_path = push_pointer(path, key);
                if !members.contains_key(key) {
                    let Some(default) = sub.get("default") else {
                        continue;
                    };
                    debug!("injecting default value at `{child_path}`");
                    members.insert(key.clone(), default.clone());
                }
                let Some(child) = members.get_mut(key) else {
                    continue;
                };
                let child_sp = push_pointer(&format!("{sp}/properties"), key);
                check!(self, ok, self.walk(child, sub, &child_path, &child_sp)?);
            }
        }

        if let Some(spec) = rules.get("required") {
            let Value::Array(names) = spec else {
                return Err(SchemaError::invalid("required", sp, "expected an array of names"));
            };
            for name in names {
                let name = name.as_str().ok_or_else(|| {
                    SchemaError::invalid("required", sp, "expected an array of names")
                })?;
                check!(
                    self,
                    ok,
                    members.contains_key(name)
                        || self.fail(path, "required", format!("missing required property `{name}`"))
                );
            }
        }

        let count = members.len();
        if let Some(min) = count_keyword(rules, "minProperties", sp)? {
            check!(
                self,
                ok,
                count >= min
                    || self.fail(
                        path,
                        "minProperties",
                        format!("has {count} properties, at least {min} required"),
                    )
            );
        }
        if let Some(max) = count_keyword(rules, "maxProperties", sp)? {
            check!(
                self,
                ok,
                count <= max
                    || self.fail(
                        path,
                        "maxProperties",
                        format!("has {count} properties, at most {max} allowed"),
                    )
            );
        }

        Ok(ok)
    }

    fn check_array(
        &mut self,
        items: &mut [Value],
        rules: &'s Map,
        path: &str,
        sp: &str,
    ) -> Result<bool, SchemaError> {
        let mut ok = true;

        match rules.get("items") {
            None => {}
            Some(schema @ Value::Object(_)) => {
                let item_sp = format!("{sp}/items");
                for (i, item) in items.iter_mut().enumerate() {
                    check!(self, ok, self.walk(item, schema, &format!("{path}/{i}"), &item_sp)?);
                }
            }
            Some(Value::Array(schemas)) => {
                for (i, (item, schema)) in items.iter_mut().zip(schemas).enumerate() {
                    check!(
                        self,
                        ok,
                        self.walk(item, schema, &format!("{path}/{i}"), &format!("{sp}/items/{i}"))?
                    );
                }
                if items.len() > schemas.len() {
                    match rules.get("additionalItems") {
                        None | Some(Value::Boolean(true)) => {}
                        Some(Value::Boolean(false)) => {
                            let message = format!(
                                "has {} items, at most {} allowed by items",
                                items.len(),
                                schemas.len()
                            );
                            check!(self, ok, self.fail(path, "additionalItems", message));
                        }
                        Some(extra @ Value::Object(_)) => {
                            let extra_sp = format!("{sp}/additionalItems");
                            for (i, item) in items.iter_mut().enumerate().skip(schemas.len()) {
                                check!(
                                    self,
                                    ok,
                                    self.walk(item, extra, &format!("{path}/{i}"), &extra_sp)?
                                );
                            }
                        }
                        Some(_) => {
                            check!(
                                self,
                                ok,
                                self.fail(
                                    path,
                                    "additionalItems",
                                    "remaining items are governed by neither a boolean nor a schema",
                                )
                            );
                        }
                    }
                }
            }
            Some(_) => {
                return Err(SchemaError::invalid(
                    "items",
                    sp,
                    "expected a schema or an array of schemas",
                ))
            }
        }

        let len = items.len();
        if let Some(min) = count_keyword(rules, "minItems", sp)? {
            check!(
                self,
                ok,
                len >= min
                    || self.fail(path, "minItems", format!("has {len} items, at least {min} required"))
            );
        }
        if let Some(max) = count_keyword(rules, "maxItems", sp)? {
            check!(
                self,
                ok,
                len <= max
                    || self.fail(path, "maxItems", format!("has {len} items, at most {max} allowed"))
            );
        }

        match rules.get("uniqueItems") {
            None | Some(Value::Boolean(false)) => {}
            Some(Value::Boolean(true)) => {
                let duplicate = (0..len).find_map(|i| {
                    (i + 1..len)
                        .find(|&j| items[i] == items[j])
                        .map(|j| (i, j))
                });
                if let Some((i, j)) = duplicate {
                    check!(
                        self,
                        ok,
                        self.fail(path, "uniqueItems", format!("items {i} and {j} are equal"))
                    );
                }
            }
            Some(_) => return Err(SchemaError::invalid("uniqueItems", sp, "expected a boolean")),
        }

        Ok(ok)
    }

    /// Lengths and patterns apply to the stored (undecoded) string content.
    fn check_string(
        &mut self,
        s: &str,
        rules: &'s Map,
        path: &str,
        sp: &str,
    ) -> Result<bool, SchemaError> {
        let mut ok = true;
        let len = s.len();

        if let Some(min) = count_keyword(rules, "minLength", sp)? {
            check!(
                self,
                ok,
                len >= min
                    || self.fail(path, "minLength", format!("is {len} bytes, at least {min} required"))
            );
        }
        if let Some(max) = count_keyword(rules, "maxLength", sp)? {
            check!(
                self,
                ok,
                len <= max
                    || self.fail(path, "maxLength", format!("is {len} bytes, at most {max} allowed"))
            );
        }
        if let Some(spec) = rules.get("pattern") {
            let Value::String(source) = spec else {
                return Err(SchemaError::invalid("pattern", sp, "expected a string"));
            };
            let matched = self.regex(source, sp)?.is_match(s);
            check!(
                self,
                ok,
                matched
                    || self.fail(
                        path,
                        "pattern",
                        format!("does not match pattern `{}`", decode_string(source)),
                    )
            );
        }

        Ok(ok)
    }

    fn check_number(
        &mut self,
        n: f64,
        rules: &'s Map,
        path: &str,
        sp: &str,
    ) -> Result<bool, SchemaError> {
        let mut ok = true;

        if let Some(divisor) = number_keyword(rules, "multipleOf", sp)? {
            if divisor <= 0.0 {
                return Err(SchemaError::invalid(
                    "multipleOf",
                    sp,
                    "divisor must be strictly positive",
                ));
            }
            let quotient = n / divisor;
            check!(
                self,
                ok,
                approx_eq(quotient, quotient.round())
                    || self.fail(path, "multipleOf", format!("{n} is not a multiple of {divisor}"))
            );
        }

        let maximum = number_keyword(rules, "maximum", sp)?;
        let exclusive = exclusive_flag(rules, "exclusiveMaximum", "maximum", maximum.is_some(), sp)?;
        if let Some(max) = maximum {
            let passed = if exclusive { n < max } else { n <= max };
            let relation = if exclusive { "less than" } else { "at most" };
            check!(
                self,
                ok,
                passed || self.fail(path, "maximum", format!("{n} is not {relation} {max}"))
            );
        }

        let minimum = number_keyword(rules, "minimum", sp)?;
        let exclusive = exclusive_flag(rules, "exclusiveMinimum", "minimum", minimum.is_some(), sp)?;
        if let Some(min) = minimum {
            let passed = if exclusive { n > min } else { n >= min };
            let relation = if exclusive { "greater than" } else { "at least" };
            check!(
                self,
                ok,
                passed || self.fail(path, "minimum", format!("{n} is not {relation} {min}"))
            );
        }

        Ok(ok)
    }

    /// Compiles a `pattern` once per walk.
    fn regex(&mut self, source: &'s str, sp: &str) -> Result<&Regex, SchemaError> {
        match self.patterns.entry(source) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let compiled = Regex::new(&decode_string(source))
                    .map_err(|err| SchemaError::invalid("pattern", sp, err.to_string()))?;
                Ok(entry.insert(compiled))
            }
        }
    }
}

fn type_matches(data: &Value, name: &str) -> bool {
    match name {
        "any" => true,
        "integer" => data.is_integer(),
        _ => data.kind_name() == name,
    }
}

/// `not` also takes a single schema.
fn schema_list<'s>(keyword: &str, spec: &'s Value, sp: &str) -> Result<&'s [Value], SchemaError> {
    match spec {
        Value::Array(items) => Ok(items.as_slice()),
        Value::Object(_) if keyword == "not" => Ok(std::slice::from_ref(spec)),
        _ => Err(SchemaError::invalid(keyword, sp, "expected an array of schemas")),
    }
}

fn number_keyword(rules: &Map, keyword: &str, sp: &str) -> Result<Option<f64>, SchemaError> {
    match rules.get(keyword) {
        None => Ok(None),
        Some(Value::Number(n)) if n.is_finite() => Ok(Some(*n)),
        Some(_) => Err(SchemaError::invalid(keyword, sp, "expected a number")),
    }
}

fn count_keyword(rules: &Map, keyword: &str, sp: &str) -> Result<Option<usize>, SchemaError> {
    match rules.get(keyword) {
        None => Ok(None),
        Some(value) if value.is_integer() && value.as_f64().is_some_and(|n| n >= 0.0) => {
            Ok(value.as_f64().map(|n| n as usize))
        }
        Some(_) => Err(SchemaError::invalid(
            keyword,
            sp,
            "expected a non-negative integer",
        )),
    }
}

fn exclusive_flag(
    rules: &Map,
    keyword: &str,
    bound: &str,
    has_bound: bool,
    sp: &str,
) -> Result<bool, SchemaError> {
    match rules.get(keyword) {
        None => Ok(false),
        Some(_) if !has_bound => Err(SchemaError::invalid(
            keyword,
            sp,
            format!("requires `{bound}` in the same schema"),
        )),
        Some(Value::Boolean(flag)) => Ok(*flag),
        Some(_) => Err(SchemaError::invalid(keyword, sp, "expected a boolean")),
    }
}

fn push_pointer(base: &str, key: &str) -> String {
    format!("{base}/{}", key.replace('~', "~0").replace('/', "~1"))
}

fn describe(data: &Value) -> String {
    match data {
        Value::Array(_) => "array".to_string(),
        Value::Object(_) => "object".to_string(),
        scalar => scalar.to_string(),
    }
}
