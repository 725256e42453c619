//! The per-file preprocessor.
//!
//! Line-oriented: handles `` `define `` (with continuations and argument
//! lists), `` `include `` (resolved against the including file's directory
//! then the include paths, expanded inline, recorded with balanced
//! push/pop section infos), `` `timescale `` and `` `line ``, and expands
//! macro uses in ordinary lines. Every processed file — the entry file and
//! each include — yields its own output bundle so each gets its own cache.

use std::path::{Path, PathBuf};

use sylva_ast::{
    FileContent, IncludeAction, IncludeContext, IncludeFileInfo, LineTranslation, MacroDef,
    MacroKind, NodeId, PpFileData, TimeInfo, TimeScope, TimeUnit, VObject,
};
use sylva_common::{Interner, Symbol};
use sylva_diagnostics::{Diagnostic, ErrorKind, Location};
use sylva_source::fs_utils;

use crate::node_kind;
use crate::unit::CompilationUnit;

/// Everything preprocessing one file produced.
#[derive(Debug)]
pub struct PpOutput {
    /// The source file.
    pub source: PathBuf,
    /// Cacheable data: macros, includes, body, time infos, translations,
    /// include infos.
    pub data: PpFileData,
    /// Preprocessor-produced nodes.
    pub content: FileContent,
    /// Diagnostics scoped to this file.
    pub diagnostics: Vec<Diagnostic>,
}

/// Shared walk state: the macro context spans files, the active stack
/// breaks include cycles, and `nested` collects one output per distinct
/// included file.
struct PpState {
    macros: sylva_ast::MacroStorage,
    active: Vec<PathBuf>,
    nested: Vec<PpOutput>,
}

/// The preprocessor for one compilation unit.
pub struct Preprocessor<'a> {
    interner: &'a Interner,
    unit: &'a CompilationUnit,
    include_paths: Vec<PathBuf>,
    library: Symbol,
    initial_macros: sylva_ast::MacroStorage,
}

impl<'a> Preprocessor<'a> {
    /// Creates a preprocessor resolving includes against `include_paths`.
    pub fn new(
        interner: &'a Interner,
        unit: &'a CompilationUnit,
        include_paths: &[PathBuf],
        library: Symbol,
    ) -> Self {
        Self {
            interner,
            unit,
            include_paths: include_paths.to_vec(),
            library,
            initial_macros: sylva_ast::MacroStorage::new(),
        }
    }

    /// Seeds the macro table with command-line defines (`-D`, `+define+`).
    ///
    /// These are visible to every file but are not recorded as defined *in*
    /// any file, so they do not enter the per-file caches as macros — the
    /// validator compares them as `NAME=value` strings instead.
    pub fn with_defines<'d>(
        mut self,
        defines: impl IntoIterator<Item = (&'d String, &'d String)>,
    ) -> Self {
        for (name, value) in defines {
            let tokens = if value.is_empty() {
                Vec::new()
            } else {
                value.split_whitespace().map(str::to_string).collect()
            };
            self.initial_macros.insert(
                name.clone(),
                MacroDef {
                    kind: MacroKind::NoArgs,
                    start_line: 0,
                    start_column: 0,
                    end_line: 0,
                    end_column: 0,
                    arguments: Vec::new(),
                    tokens,
                },
            );
        }
        self
    }

    /// Preprocesses `path` and every file it includes.
    ///
    /// The entry file's output comes first, followed by one output per
    /// distinct included file (each of which gets its own cache).
    pub fn preprocess(&self, path: &Path) -> Vec<PpOutput> {
        let mut state = PpState {
            macros: self.initial_macros.clone(),
            active: Vec::new(),
            nested: Vec::new(),
        };
        let entry = self.process_file(path, &mut state);
        let mut outputs = Vec::with_capacity(1 + state.nested.len());
        outputs.push(entry);
        outputs.extend(state.nested);
        outputs
    }

    fn process_file(&self, path: &Path, state: &mut PpState) -> PpOutput {
        let file_sym = self.interner.register(&path.to_string_lossy());
        let mut content = FileContent::new(file_sym, self.library);
        let root = content.add_node(VObject::new(file_sym, node_kind::PP_FILE, file_sym, 1, 1));
        let mut out = PpOutput {
            source: path.to_path_buf(),
            data: PpFileData::default(),
            content,
            diagnostics: Vec::new(),
        };

        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(_) => {
                out.diagnostics.push(Diagnostic::new(
                    ErrorKind::CmdSourceFileDoesNotExist,
                    Location::object(file_sym),
                ));
                return out;
            }
        };

        state.active.push(path.to_path_buf());
        let mut last_child = NodeId::INVALID;
        let mut out_line: u32 = 0;

        let lines: Vec<&str> = text.lines().collect();
        let mut i = 0;
        while i < lines.len() {
            let line_no = (i + 1) as u32;
            let raw = lines[i];
            let trimmed = raw.trim_start();
            let col = (raw.len() - trimmed.len() + 1) as u16;

            if let Some(rest) = strip_directive(trimmed, "define") {
                let mut def_text = rest.to_string();
                let mut end_line = line_no;
                while def_text.trim_end().ends_with('\\') && i + 1 < lines.len() {
                    let cut = def_text.trim_end().len() - 1;
                    def_text.truncate(cut);
                    i += 1;
                    end_line += 1;
                    def_text.push(' ');
                    def_text.push_str(lines[i].trim());
                }
                self.handle_define(
                    &def_text, line_no, col, end_line, file_sym, root, &mut last_child, &mut out,
                    state,
                );
                for _ in line_no..=end_line {
                    out.data.body.push('\n');
                    out_line += 1;
                }
            } else if let Some(rest) = strip_directive(trimmed, "include") {
                self.handle_include(
                    rest,
                    line_no,
                    col,
                    path,
                    file_sym,
                    root,
                    &mut last_child,
                    &mut out_line,
                    &mut out,
                    state,
                );
            } else if let Some(rest) = strip_directive(trimmed, "timescale") {
                self.handle_timescale(rest, line_no, col, file_sym, root, &mut last_child, &mut out);
                out.data.body.push('\n');
                out_line += 1;
            } else if let Some(rest) = strip_directive(trimmed, "line") {
                self.handle_line_directive(rest, line_no, file_sym, root, &mut last_child, &mut out);
                out.data.body.push('\n');
                out_line += 1;
            } else {
                let expanded = expand_macros(raw, &state.macros);
                out.data.body.push_str(&expanded);
                out.data.body.push('\n');
                out_line += 1;
            }
            i += 1;
        }

        state.active.pop();
        out
    }

    #[allow(clippy::too_many_arguments)]
    fn handle_define(
        &self,
        def_text: &str,
        start_line: u32,
        start_column: u16,
        end_line: u32,
        file_sym: Symbol,
        root: NodeId,
        last_child: &mut NodeId,
        out: &mut PpOutput,
        state: &mut PpState,
    ) {
        let def_text = def_text.trim();
        let name_len = ident_len(def_text);
        if name_len == 0 {
            out.diagnostics.push(Diagnostic::new(
                ErrorKind::PpSyntaxError,
                Location::in_file(file_sym, start_line, start_column),
            ));
            return;
        }
        let name = &def_text[..name_len];
        let rest = &def_text[name_len..];

        let (kind, arguments, body) = if let Some(after_paren) = rest.strip_prefix('(') {
            match after_paren.find(')') {
                Some(close) => {
                    let args: Vec<String> = after_paren[..close]
                        .split(',')
                        .map(|a| a.trim().to_string())
                        .filter(|a| !a.is_empty())
                        .collect();
                    (
                        MacroKind::WithArgs,
                        args,
                        after_paren[close + 1..].trim().to_string(),
                    )
                }
                None => {
                    out.diagnostics.push(Diagnostic::new(
                        ErrorKind::PpSyntaxError,
                        Location::in_file(file_sym, start_line, start_column),
                    ));
                    return;
                }
            }
        } else {
            (MacroKind::NoArgs, Vec::new(), rest.trim().to_string())
        };

        let tokens: Vec<String> = body.split_whitespace().map(str::to_string).collect();
        let def = MacroDef {
            kind,
            start_line,
            start_column,
            end_line,
            end_column: start_column.saturating_add(def_text.len() as u16),
            arguments,
            tokens,
        };
        state.macros.insert(name.to_string(), def.clone());
        out.data.macros.insert(name.to_string(), def);

        let name_sym = self.interner.register(name);
        let node = out.content.add_node(VObject {
            parent: root,
            ..VObject::new(
                name_sym,
                node_kind::PP_MACRO_DEFINITION,
                file_sym,
                start_line,
                start_column,
            )
        });
        attach_child(&mut out.content, root, last_child, node);
    }

    #[allow(clippy::too_many_arguments)]
    fn handle_include(
        &self,
        rest: &str,
        line_no: u32,
        col: u16,
        current: &Path,
        file_sym: Symbol,
        root: NodeId,
        last_child: &mut NodeId,
        out_line: &mut u32,
        out: &mut PpOutput,
        state: &mut PpState,
    ) {
        let Some(name) = quoted_name(rest) else {
            out.diagnostics.push(Diagnostic::new(
                ErrorKind::PpSyntaxError,
                Location::in_file(file_sym, line_no, col),
            ));
            out.data.body.push('\n');
            *out_line += 1;
            return;
        };

        let Some(resolved) = self.resolve_include(name, &fs_utils::parent_dir(current)) else {
            out.diagnostics.push(Diagnostic::new(
                ErrorKind::PpIncludeFileDoesNotExist,
                Location {
                    file: file_sym,
                    line: line_no,
                    column: col,
                    object: self.interner.register(name),
                },
            ));
            out.data.body.push('\n');
            *out_line += 1;
            return;
        };

        if state.active.contains(&resolved) {
            // Include cycle: the file is already being expanded above us.
            out.data.body.push('\n');
            *out_line += 1;
            return;
        }

        let inc_sym = self.interner.register(&resolved.to_string_lossy());
        let end_column = col.saturating_add(rest.len() as u16);

        let push_index = out.data.include_infos.len() as u32;
        out.data.include_infos.push(IncludeFileInfo {
            context: IncludeContext::Include,
            section_start_line: *out_line + 1,
            section_file: inc_sym,
            original_start_line: line_no,
            original_start_column: col,
            original_end_line: line_no,
            original_end_column: end_column,
            action: IncludeAction::Push,
            index_opening: push_index,
            index_closing: 0,
        });

        let child = self.process_file(&resolved, state);

        out.data.body.push_str(&child.data.body);
        *out_line += child.data.body.matches('\n').count() as u32;

        out.data.includes.push(resolved.clone());
        for inc in &child.data.includes {
            out.data.includes.push(inc.clone());
        }

        if !state.nested.iter().any(|o| o.source == child.source) {
            state.nested.push(child);
        }

        let pop_index = out.data.include_infos.len() as u32;
        out.data.include_infos.push(IncludeFileInfo {
            context: IncludeContext::Include,
            section_start_line: *out_line + 1,
            section_file: file_sym,
            original_start_line: line_no,
            original_start_column: col,
            original_end_line: line_no,
            original_end_column: end_column,
            action: IncludeAction::Pop,
            index_opening: push_index,
            index_closing: pop_index,
        });
        out.data.include_infos[push_index as usize].index_closing = pop_index;

        let node = out.content.add_node(VObject {
            parent: root,
            ..VObject::new(inc_sym, node_kind::PP_INCLUDE, file_sym, line_no, col)
        });
        attach_child(&mut out.content, root, last_child, node);
    }

    #[allow(clippy::too_many_arguments)]
    fn handle_timescale(
        &self,
        rest: &str,
        line_no: u32,
        col: u16,
        file_sym: Symbol,
        root: NodeId,
        last_child: &mut NodeId,
        out: &mut PpOutput,
    ) {
        let Some(mut info) = parse_timescale(rest) else {
            out.diagnostics.push(Diagnostic::new(
                ErrorKind::PpSyntaxError,
                Location::in_file(file_sym, line_no, col),
            ));
            return;
        };
        info.scope = TimeScope::File;
        info.file = file_sym;
        info.line = line_no;
        out.data.time_infos.push(info);
        self.unit.record_time_info(info);

        let node = out.content.add_node(VObject {
            parent: root,
            ..VObject::new(file_sym, node_kind::PP_TIMESCALE, file_sym, line_no, col)
        });
        attach_child(&mut out.content, root, last_child, node);
    }

    fn handle_line_directive(
        &self,
        rest: &str,
        line_no: u32,
        file_sym: Symbol,
        root: NodeId,
        last_child: &mut NodeId,
        out: &mut PpOutput,
    ) {
        let mut parts = rest.split_whitespace();
        let pretend_line = parts.next().and_then(|n| n.parse::<u32>().ok());
        let pretend_file = quoted_name(rest);
        if let (Some(pretend_line), Some(pretend_file)) = (pretend_line, pretend_file) {
            out.data.line_translations.push(LineTranslation {
                pretend_file: self.interner.register(pretend_file),
                original_line: line_no,
                pretend_line,
            });
            let node = out.content.add_node(VObject {
                parent: root,
                ..VObject::new(
                    self.interner.register(pretend_file),
                    node_kind::PP_LINE_DIRECTIVE,
                    file_sym,
                    line_no,
                    1,
                )
            });
            attach_child(&mut out.content, root, last_child, node);
        }
    }

    fn resolve_include(&self, name: &str, current_dir: &Path) -> Option<PathBuf> {
        let direct = current_dir.join(name);
        if direct.is_file() {
            return Some(fs_utils::preferred_path(&direct));
        }
        for dir in &self.include_paths {
            let candidate = dir.join(name);
            if candidate.is_file() {
                return Some(fs_utils::preferred_path(&candidate));
            }
        }
        None
    }
}

/// Links `node` into `root`'s child list, chaining siblings in order.
fn attach_child(content: &mut FileContent, root: NodeId, last_child: &mut NodeId, node: NodeId) {
    if last_child.is_invalid() {
        if let Some(root_obj) = content.node_mut(root) {
            root_obj.child = node;
        }
    } else if let Some(prev) = content.node_mut(*last_child) {
        prev.sibling = node;
    }
    *last_child = node;
}

/// Matches `` `<directive> `` at the start of a trimmed line; returns the
/// text after the directive keyword.
fn strip_directive<'t>(trimmed: &'t str, directive: &str) -> Option<&'t str> {
    let rest = trimmed.strip_prefix('`')?.strip_prefix(directive)?;
    if rest.is_empty() || rest.starts_with(char::is_whitespace) {
        Some(rest.trim_start())
    } else {
        None
    }
}

/// Length of the leading identifier of `s`.
fn ident_len(s: &str) -> usize {
    let mut chars = s.char_indices();
    match chars.next() {
        Some((_, c)) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return 0,
    }
    for (i, c) in chars {
        if !(c.is_ascii_alphanumeric() || c == '_' || c == '$') {
            return i;
        }
    }
    s.len()
}

/// Extracts the content of the first double-quoted string in `s`.
fn quoted_name(s: &str) -> Option<&str> {
    let open = s.find('"')?;
    let rest = &s[open + 1..];
    let close = rest.find('"')?;
    Some(&rest[..close])
}

/// Parses a `unit/precision` timescale specification (`"1ns/1ps"`,
/// whitespace tolerated) into a [`TimeInfo`] with global scope and no
/// provenance; callers fill in scope, file and line.
pub fn parse_timescale(spec: &str) -> Option<TimeInfo> {
    let compact: String = spec.chars().filter(|c| !c.is_whitespace()).collect();
    let (unit_part, precision_part) = compact.split_once('/')?;
    let (unit_value, unit) = parse_time_value(unit_part)?;
    let (precision_value, precision) = parse_time_value(precision_part)?;
    Some(TimeInfo {
        scope: TimeScope::Global,
        file: Symbol::BAD,
        line: 0,
        unit,
        unit_value,
        precision,
        precision_value,
    })
}

/// Parses one side of a timescale (`"1ns"`, `"100ps"`).
fn parse_time_value(s: &str) -> Option<(f64, TimeUnit)> {
    let digits = s.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 {
        return None;
    }
    let value: f64 = s[..digits].parse().ok()?;
    let unit = TimeUnit::from_suffix(&s[digits..])?;
    Some((value, unit))
}

/// Expands macro uses (`` `NAME ``, `` `NAME(args) ``) in one line.
///
/// Runs to a fixed point (bounded) so macros whose bodies use other macros
/// expand fully. Unknown macro names are left untouched.
pub fn expand_macros(line: &str, macros: &sylva_ast::MacroStorage) -> String {
    let mut current = line.to_string();
    for _ in 0..8 {
        let next = expand_once(&current, macros);
        if next == current {
            break;
        }
        current = next;
    }
    current
}

fn expand_once(line: &str, macros: &sylva_ast::MacroStorage) -> String {
    let mut out = String::with_capacity(line.len());
    let mut rest = line;
    while let Some(tick) = rest.find('`') {
        out.push_str(&rest[..tick]);
        let after = &rest[tick + 1..];
        let name_len = ident_len(after);
        if name_len == 0 {
            out.push('`');
            rest = after;
            continue;
        }
        let name = &after[..name_len];
        match macros.get(name) {
            Some(def) if def.kind == MacroKind::NoArgs => {
                out.push_str(&def.tokens.join(" "));
                rest = &after[name_len..];
            }
            Some(def) => {
                let tail = &after[name_len..];
                match parse_actuals(tail) {
                    Some((actuals, consumed)) => {
                        out.push_str(&substitute(def, &actuals));
                        rest = &tail[consumed..];
                    }
                    None => {
                        // Argument-taking macro used without arguments:
                        // leave the text untouched.
                        out.push('`');
                        out.push_str(name);
                        rest = &after[name_len..];
                    }
                }
            }
            None => {
                out.push('`');
                out.push_str(name);
                rest = &after[name_len..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Parses a balanced `(...)` actual list. Returns the actuals and the
/// number of bytes consumed (including both parens).
fn parse_actuals(s: &str) -> Option<(Vec<String>, usize)> {
    if !s.starts_with('(') {
        return None;
    }
    let mut depth = 0usize;
    let mut actuals = Vec::new();
    let mut current = String::new();
    for (i, c) in s.char_indices() {
        match c {
            '(' => {
                depth += 1;
                if depth > 1 {
                    current.push(c);
                }
            }
            ')' => {
                depth -= 1;
                if depth == 0 {
                    actuals.push(current.trim().to_string());
                    return Some((actuals, i + 1));
                }
                current.push(c);
            }
            ',' if depth == 1 => {
                actuals.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }
    None
}

/// Substitutes actuals for formals in a macro body, word-wise.
fn substitute(def: &MacroDef, actuals: &[String]) -> String {
    let expanded: Vec<String> = def
        .tokens
        .iter()
        .map(|token| {
            let mut result = String::with_capacity(token.len());
            let mut rest = token.as_str();
            while !rest.is_empty() {
                let len = ident_len(rest);
                if len > 0 {
                    let word = &rest[..len];
                    match def.arguments.iter().position(|a| a == word) {
                        Some(idx) if idx < actuals.len() => result.push_str(&actuals[idx]),
                        _ => result.push_str(word),
                    }
                    rest = &rest[len..];
                } else {
                    let mut chars = rest.chars();
                    result.push(chars.next().unwrap());
                    rest = chars.as_str();
                }
            }
            result
        })
        .collect();
    expanded.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use sylva_ast::push_pop_balanced;

    fn write(dir: &Path, name: &str, text: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, text).unwrap();
        path
    }

    fn pp<'a>(
        interner: &'a Interner,
        unit: &'a CompilationUnit,
        incdirs: &[PathBuf],
    ) -> Preprocessor<'a> {
        let lib = interner.register("work");
        Preprocessor::new(interner, unit, incdirs, lib)
    }

    #[test]
    fn define_and_use() {
        let dir = tempfile::tempdir().unwrap();
        let top = write(
            dir.path(),
            "top.sv",
            "`define W 8\nmodule m; logic [`W-1:0] x; endmodule\n",
        );
        let interner = Interner::new();
        let unit = CompilationUnit::new();
        let outputs = pp(&interner, &unit, &[]).preprocess(&top);
        assert_eq!(outputs.len(), 1);
        let out = &outputs[0];
        assert!(out.diagnostics.is_empty());
        assert_eq!(out.data.macros.len(), 1);
        assert!(out.data.body.contains("logic [8-1:0] x"));
        // Directive line preserved as a blank line.
        assert!(out.data.body.starts_with('\n'));
    }

    #[test]
    fn command_line_defines_are_visible_but_not_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let top = write(dir.path(), "top.sv", "wire [`W-1:0] w;\n");
        let interner = Interner::new();
        let unit = CompilationUnit::new();
        let lib = interner.register("work");
        let mut defines = std::collections::BTreeMap::new();
        defines.insert("W".to_string(), "8".to_string());
        let outputs = Preprocessor::new(&interner, &unit, &[], lib)
            .with_defines(&defines)
            .preprocess(&top);
        let out = &outputs[0];
        assert!(out.data.body.contains("wire [8-1:0] w"));
        // Not defined in the file, so not part of its cached macro table.
        assert!(out.data.macros.is_empty());
    }

    #[test]
    fn define_with_args_expands() {
        let dir = tempfile::tempdir().unwrap();
        let top = write(
            dir.path(),
            "top.sv",
            "`define SUM(a, b) ((a) + (b))\nassign y = `SUM(p, q);\n",
        );
        let interner = Interner::new();
        let unit = CompilationUnit::new();
        let outputs = pp(&interner, &unit, &[]).preprocess(&top);
        let body = &outputs[0].data.body;
        assert!(body.contains("((p) + (q))"), "body: {body}");
        let def = &outputs[0].data.macros["SUM"];
        assert_eq!(def.kind, MacroKind::WithArgs);
        assert_eq!(def.arguments, vec!["a", "b"]);
    }

    #[test]
    fn define_continuation_lines() {
        let dir = tempfile::tempdir().unwrap();
        let top = write(
            dir.path(),
            "top.sv",
            "`define TWO \\\n  2\nwire [`TWO:0] w;\n",
        );
        let interner = Interner::new();
        let unit = CompilationUnit::new();
        let outputs = pp(&interner, &unit, &[]).preprocess(&top);
        let out = &outputs[0];
        let def = &out.data.macros["TWO"];
        assert_eq!(def.start_line, 1);
        assert_eq!(def.end_line, 2);
        assert!(out.data.body.contains("wire [2:0] w"));
    }

    #[test]
    fn include_is_inlined_and_recorded() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "defs.svh", "`define DEPTH 4\n");
        let top = write(
            dir.path(),
            "top.sv",
            "`include \"defs.svh\"\nmodule m; logic [`DEPTH:0] q; endmodule\n",
        );
        let interner = Interner::new();
        let unit = CompilationUnit::new();
        let outputs = pp(&interner, &unit, &[]).preprocess(&top);

        assert_eq!(outputs.len(), 2, "entry plus one include");
        let top_out = &outputs[0];
        assert!(top_out.data.body.contains("logic [4:0] q"));
        assert_eq!(top_out.data.includes.len(), 1);
        assert!(push_pop_balanced(&top_out.data.include_infos));
        assert_eq!(top_out.data.include_infos.len(), 2);

        let inc_out = &outputs[1];
        assert!(inc_out.source.ends_with("defs.svh"));
        assert_eq!(inc_out.data.macros.len(), 1);
    }

    #[test]
    fn include_diamond_keeps_one_output_per_file() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "common.svh", "`define C 1\n");
        write(dir.path(), "a.svh", "`include \"common.svh\"\nwire a;\n");
        write(dir.path(), "b.svh", "`include \"common.svh\"\nwire b;\n");
        let top = write(
            dir.path(),
            "top.sv",
            "`include \"a.svh\"\n`include \"b.svh\"\nmodule m; endmodule\n",
        );
        let interner = Interner::new();
        let unit = CompilationUnit::new();
        let outputs = pp(&interner, &unit, &[]).preprocess(&top);

        // top + a + b + common, even though common is reached twice.
        assert_eq!(outputs.len(), 4);
        let top_out = &outputs[0];
        // Transitive include set: a, b, and common (twice, pre-dedup).
        assert!(top_out.data.includes.iter().filter(|p| p.ends_with("common.svh")).count() >= 1);
        assert!(push_pop_balanced(&top_out.data.include_infos));
    }

    #[test]
    fn include_cycle_terminates() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.svh", "`include \"b.svh\"\nwire a;\n");
        write(dir.path(), "b.svh", "`include \"a.svh\"\nwire b;\n");
        let top = write(dir.path(), "top.sv", "`include \"a.svh\"\n");
        let interner = Interner::new();
        let unit = CompilationUnit::new();
        let outputs = pp(&interner, &unit, &[]).preprocess(&top);
        assert_eq!(outputs.len(), 3);
        assert!(outputs[0].data.body.contains("wire a"));
        assert!(outputs[0].data.body.contains("wire b"));
    }

    #[test]
    fn missing_include_is_diagnosed() {
        let dir = tempfile::tempdir().unwrap();
        let top = write(dir.path(), "top.sv", "`include \"nope.svh\"\n");
        let interner = Interner::new();
        let unit = CompilationUnit::new();
        let outputs = pp(&interner, &unit, &[]).preprocess(&top);
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].diagnostics.len(), 1);
        assert_eq!(
            outputs[0].diagnostics[0].kind,
            ErrorKind::PpIncludeFileDoesNotExist
        );
    }

    #[test]
    fn include_resolves_through_include_paths() {
        let dir = tempfile::tempdir().unwrap();
        let incdir = dir.path().join("rtl");
        std::fs::create_dir(&incdir).unwrap();
        write(&incdir, "defs.svh", "`define FROM_RTL 1\n");
        let top = write(dir.path(), "top.sv", "`include \"defs.svh\"\n");
        let interner = Interner::new();
        let unit = CompilationUnit::new();
        let outputs = pp(&interner, &unit, &[incdir]).preprocess(&top);
        assert_eq!(outputs.len(), 2);
        assert!(outputs[0].diagnostics.is_empty());
    }

    #[test]
    fn timescale_is_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let top = write(dir.path(), "top.sv", "`timescale 1ns / 10ps\nmodule m; endmodule\n");
        let interner = Interner::new();
        let unit = CompilationUnit::new();
        let outputs = pp(&interner, &unit, &[]).preprocess(&top);
        let infos = &outputs[0].data.time_infos;
        assert_eq!(infos.len(), 1);
        assert_eq!(infos[0].unit, TimeUnit::Nanosecond);
        assert_eq!(infos[0].unit_value, 1.0);
        assert_eq!(infos[0].precision, TimeUnit::Picosecond);
        assert_eq!(infos[0].precision_value, 10.0);
        assert_eq!(unit.time_infos().len(), 1);
    }

    #[test]
    fn line_directive_is_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let top = write(dir.path(), "top.sv", "`line 100 \"orig.sv\" 0\nwire w;\n");
        let interner = Interner::new();
        let unit = CompilationUnit::new();
        let outputs = pp(&interner, &unit, &[]).preprocess(&top);
        let lts = &outputs[0].data.line_translations;
        assert_eq!(lts.len(), 1);
        assert_eq!(lts[0].pretend_line, 100);
        assert_eq!(interner.symbol(lts[0].pretend_file), "orig.sv");
    }

    #[test]
    fn empty_file_produces_empty_output() {
        let dir = tempfile::tempdir().unwrap();
        let top = write(dir.path(), "empty.sv", "");
        let interner = Interner::new();
        let unit = CompilationUnit::new();
        let outputs = pp(&interner, &unit, &[]).preprocess(&top);
        assert_eq!(outputs.len(), 1);
        let out = &outputs[0];
        assert!(out.data.macros.is_empty());
        assert!(out.data.includes.is_empty());
        assert!(out.data.body.is_empty());
        assert!(out.diagnostics.is_empty());
        // Just the sentinel and the file root node.
        assert_eq!(out.content.node_count(), 2);
    }

    #[test]
    fn nodes_are_linked_under_the_root() {
        let dir = tempfile::tempdir().unwrap();
        let top = write(dir.path(), "top.sv", "`define A 1\n`define B 2\n");
        let interner = Interner::new();
        let unit = CompilationUnit::new();
        let outputs = pp(&interner, &unit, &[]).preprocess(&top);
        let content = &outputs[0].content;
        // sentinel + root + two macro nodes
        assert_eq!(content.node_count(), 4);
        let (root_id, root) = content.nodes().next().unwrap();
        assert_eq!(root.kind, node_kind::PP_FILE);
        let first = content.node(root.child).unwrap();
        assert_eq!(first.kind, node_kind::PP_MACRO_DEFINITION);
        assert_eq!(first.parent, root_id);
        let second = content.node(first.sibling).unwrap();
        assert_eq!(interner.symbol(second.name), "B");
    }
}
