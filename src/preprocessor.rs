//! Removal of inactive preprocessor blocks and unused macro definitions.
//!
//! Unlike the declaration pass, this one is event-driven: an external
//! preprocessor replays its directive and macro callbacks into
//! [`PreprocessorPass`], which tracks `#if`/`#elif`/`#else`/`#endif` clause
//! groups and macro lifetimes, and emits whole-line removal ranges on
//! [`finalize`](PreprocessorPass::finalize).
//!
//! Directive events must only be delivered for the main file.
//! [`macro_defined`](PreprocessorPass::macro_defined) is the exception: it
//! should be called for header and builtin macros too (with no definition
//! range), so `#ifdef` evaluation stays accurate.

use crate::ast::Span;
use crate::config::Config;
use crate::ranges::{line_end, line_start};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Evaluation result of a `#if` or `#elif` condition, as reported by the
/// external preprocessor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionValue {
    False,
    True,
    /// The condition was not evaluated (an enclosing branch was not taken)
    NotEvaluated,
}

/// One `#if`..`#endif` group under construction
#[derive(Debug)]
struct IfDefClause {
    /// Locations of the `#if`/`#ifdef`/`#ifndef`/`#elif`/`#else`/`#endif`
    /// tokens of this group, in source order
    locations: Vec<usize>,

    /// Index into `locations` of the branch that was taken
    selected_branch: Option<usize>,

    /// A condition mentions a whitelisted macro; keep the group in full
    keep_all_branches: bool,
}

impl IfDefClause {
    fn new(if_location: usize) -> Self {
        Self {
            locations: vec![if_location],
            selected_branch: None,
            keep_all_branches: false,
        }
    }
}

/// A macro `#define`d in the main file
#[derive(Debug)]
struct MacroDef {
    /// Range of the `#define` directive, including the body
    definition: Span,

    /// Location of the matching `#undef`, if the macro was undefined
    undefinition: Option<usize>,

    /// The macro was expanded somewhere in the translation unit
    expanded: bool,

    whitelisted: bool,
}

/// Tracks preprocessor events for one translation unit and computes the
/// ranges of inactive conditional branches and unused macro definitions.
#[derive(Debug)]
pub struct PreprocessorPass<'a> {
    source: &'a str,
    macros_to_keep: HashSet<String>,

    /// Open clause groups, innermost last
    clauses: Vec<IfDefClause>,

    /// Names currently `#define`d anywhere (headers included), for
    /// `#ifdef`/`#ifndef` evaluation
    defined_names: HashSet<String>,

    /// Main-file macros currently defined
    defined: HashMap<String, MacroDef>,

    /// Main-file macros that were defined and later undefined. Tracked
    /// separately because the name may be redefined afterwards.
    retired: Vec<MacroDef>,

    inactive: Vec<Span>,
}

impl<'a> PreprocessorPass<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            macros_to_keep: HashSet::new(),
            clauses: Vec::new(),
            defined_names: HashSet::new(),
            defined: HashMap::new(),
            retired: Vec::new(),
            inactive: Vec::new(),
        }
    }

    /// Create a pass with the whitelist taken from `config`
    pub fn with_config(source: &'a str, config: &Config) -> Self {
        let mut pass = Self::new(source);
        pass.macros_to_keep = config.macros_to_keep.iter().cloned().collect();
        pass
    }

    fn is_whitelisted(&self, name: &str) -> bool {
        self.macros_to_keep.contains(name)
    }

    fn condition_mentions_whitelisted(&self, condition: Span) -> bool {
        let text = self
            .source
            .get(condition.start..condition.end)
            .unwrap_or("");
        self.macros_to_keep.iter().any(|name| text.contains(name.as_str()))
    }

    /// `#define NAME ..`. Pass the directive's range for main-file
    /// definitions, `None` for header or builtin ones.
    pub fn macro_defined(&mut self, name: &str, definition: Option<Span>) {
        let whitelisted = self.is_whitelisted(name);
        self.defined_names.insert(name.to_string());

        if let Some(definition) = definition {
            let displaced = self.defined.insert(
                name.to_string(),
                MacroDef {
                    definition,
                    undefinition: None,
                    expanded: false,
                    whitelisted,
                },
            );
            // A redefinition without an intervening #undef still ends the
            // previous lifetime; judge it on its own expansions.
            if let Some(def) = displaced {
                self.retired.push(def);
            }
        }
    }

    /// `#undef NAME`. `location` is the directive's position when it is in
    /// the main file.
    pub fn macro_undefined(&mut self, name: &str, location: Option<usize>) {
        self.defined_names.remove(name);

        if let Some(mut def) = self.defined.remove(name) {
            def.undefinition = location;
            self.retired.push(def);
        }
    }

    /// The macro was expanded. Counts wherever the expansion happens; a
    /// macro used only inside a header is still used.
    pub fn macro_expands(&mut self, name: &str) {
        if let Some(def) = self.defined.get_mut(name) {
            def.expanded = true;
        }
    }

    /// `#if condition`
    pub fn if_(&mut self, location: usize, condition: Span, value: ConditionValue) {
        let mut clause = IfDefClause::new(location);
        if value == ConditionValue::True {
            clause.selected_branch = Some(0);
        }
        if self.condition_mentions_whitelisted(condition) {
            clause.keep_all_branches = true;
        }
        self.clauses.push(clause);
    }

    /// `#ifdef NAME`
    pub fn ifdef(&mut self, location: usize, name: &str) {
        let mut clause = IfDefClause::new(location);
        if self.defined_names.contains(name) {
            clause.selected_branch = Some(0);
        }
        if self.is_whitelisted(name) {
            clause.keep_all_branches = true;
        }
        self.clauses.push(clause);
    }

    /// `#ifndef NAME`
    pub fn ifndef(&mut self, location: usize, name: &str) {
        let mut clause = IfDefClause::new(location);
        if !self.defined_names.contains(name) {
            clause.selected_branch = Some(0);
        }
        if self.is_whitelisted(name) {
            clause.keep_all_branches = true;
        }
        self.clauses.push(clause);
    }

    /// `#elif condition`
    pub fn elif(&mut self, location: usize, condition: Span, value: ConditionValue) {
        let mentions_whitelisted = self.condition_mentions_whitelisted(condition);
        let Some(clause) = self.clauses.last_mut() else {
            debug!("#elif at {} without an open #if", location);
            return;
        };
        if value == ConditionValue::True {
            clause.selected_branch = Some(clause.locations.len());
        }
        clause.locations.push(location);
        if mentions_whitelisted {
            clause.keep_all_branches = true;
        }
    }

    /// `#else`
    pub fn else_(&mut self, location: usize) {
        let Some(clause) = self.clauses.last_mut() else {
            debug!("#else at {} without an open #if", location);
            return;
        };
        if clause.selected_branch.is_none() {
            clause.selected_branch = Some(clause.locations.len());
        }
        clause.locations.push(location);
    }

    /// `#endif`
    pub fn endif(&mut self, location: usize) {
        let Some(mut clause) = self.clauses.pop() else {
            debug!("#endif at {} without an open #if", location);
            return;
        };
        clause.locations.push(location);

        if clause.keep_all_branches {
            return;
        }

        let first = clause.locations[0];
        let last = clause.locations[clause.locations.len() - 1];

        match clause.selected_branch {
            // No branch taken: the whole group is inactive.
            None => self.inactive.push(Span::new(
                line_start(self.source, first),
                line_end(self.source, last),
            )),
            // Keep the selected branch's content; the directive lines and
            // every other branch go.
            Some(selected) => {
                let opening = clause.locations[selected];
                self.inactive.push(Span::new(
                    line_start(self.source, first),
                    line_end(self.source, opening),
                ));
                if let Some(&closing) = clause.locations.get(selected + 1) {
                    self.inactive.push(Span::new(
                        line_start(self.source, closing),
                        line_end(self.source, last),
                    ));
                }
            }
        }
    }

    /// Finish the pass: removal ranges for all inactive branches, plus for
    /// every non-whitelisted main-file macro that was never expanded (its
    /// `#define` line and, when present, its `#undef` line).
    pub fn finalize(self) -> Vec<Span> {
        let source = self.source;
        let mut ranges = self.inactive;

        let all_macros = self.defined.into_values().chain(self.retired);
        for def in all_macros {
            if def.whitelisted || def.expanded {
                continue;
            }

            debug!("Removing unused macro definition at {}", def.definition);
            ranges.push(Span::new(
                line_start(source, def.definition.start),
                def.definition.end,
            ));
            if let Some(undef) = def.undefinition {
                ranges.push(Span::new(line_start(source, undef), line_end(source, undef)));
            }
        }

        ranges.sort_by_key(|span| (span.start, span.end));
        ranges
    }
}
