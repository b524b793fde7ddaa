//! hocc-res - Substitution resolver.
//!
//! The second pass. Walks the first-pass tree, replaces every
//! [`Substitution`] according to the history stack, and leaves a tree of
//! plain objects, arrays, and scalars.
//!
//! Resolution of one substitution folds its pieces left to right into an
//! accumulator. Inline pieces deep-copy in; reference pieces search the
//! history stack — a self-reference only sees entries recorded before
//! its own substitution was pushed, everything else takes the latest
//! entry. Misses retry with the include prefix stripped, then fall back
//! to the environment. Optional references that stay unresolved
//! contribute nothing; if the whole substitution produced nothing, its
//! object key or array slot is removed.
//!
//! Failures (unresolved non-optional references, reference cycles, kind
//! mismatches) are reported to the shared [`Handler`] and resolution
//! continues elsewhere, so one bad reference does not hide the rest.
//!
//! # Example
//!
//! ```
//! use hocc_par::{parse_str, reader::NullReader, Value};
//! use hocc_res::{resolve, env::MapEnv};
//! use hocc_util::Handler;
//!
//! let handler = Handler::new();
//! let output = parse_str("a = 2\nb = ${a}", &handler, &NullReader).unwrap();
//! let mut root = output.root;
//! resolve(&mut root, &output.stack, &MapEnv::new(), &handler);
//!
//! assert!(!root.has_substitutions());
//! ```

pub mod env;

pub use env::{Environment, MapEnv, ProcessEnv};

use rustc_hash::FxHashSet;

use hocc_par::path::{is_path_prefix, is_self_reference, join_path};
use hocc_par::stack::{Stack, StackEntry};
use hocc_par::value::{PathRef, PieceValue, Scalar, Substitution, Value};
use hocc_util::{ErrorKind, Handler, Span};

/// Resolves every substitution in `root` against `stack`.
///
/// After this returns, `root` contains no substitution nodes. Problems
/// are reported through `handler`; the caller decides what an invalid
/// configuration means.
pub fn resolve(root: &mut Value, stack: &Stack, env: &dyn Environment, handler: &Handler) {
    let resolver = Resolver {
        stack,
        env,
        handler,
    };
    resolver.resolve_node(root, None);
}

/// Outcome of resolving one path reference.
enum RefOutcome {
    /// Resolved to a value.
    Found(Value),
    /// Optional and absent: the piece contributes nothing.
    Skip,
    /// Non-optional and absent: resolution of this substitution stops.
    Fail,
}

struct Resolver<'a> {
    stack: &'a Stack,
    env: &'a dyn Environment,
    handler: &'a Handler,
}

impl<'a> Resolver<'a> {
    /// Walks a tree, resolving substitutions in place.
    ///
    /// `shared` carries the in-flight substitution set while resolving
    /// values pulled out of the stack, so cycles spanning nested
    /// resolution are still caught. At the top level each substitution
    /// starts its own set.
    fn resolve_node(&self, value: &mut Value, mut shared: Option<&mut FxHashSet<u64>>) {
        match value {
            Value::Object(obj) => {
                let keys: Vec<String> = obj.keys().cloned().collect();
                for key in keys {
                    let is_sub = matches!(obj.get(&key), Some(Value::Substitution(_)));
                    if is_sub {
                        let sub = match obj.get(&key) {
                            Some(Value::Substitution(s)) => s.clone(),
                            _ => continue,
                        };
                        match self.resolve_entry(&sub, shared.as_deref_mut()) {
                            Some(resolved) => obj.insert(key, resolved),
                            None => {
                                obj.shift_remove(&key);
                            }
                        }
                    } else if let Some(child) = obj.get_mut(&key) {
                        self.resolve_node(child, shared.as_deref_mut());
                    }
                }
            }
            Value::Array(items) => {
                let mut resolved_items = Vec::with_capacity(items.len());
                for item in items.drain(..) {
                    match item {
                        Value::Substitution(sub) => {
                            // An absent optional elides the slot; later
                            // siblings shift down to keep indices dense.
                            if let Some(v) = self.resolve_entry(&sub, shared.as_deref_mut()) {
                                resolved_items.push(v);
                            }
                        }
                        mut other => {
                            self.resolve_node(&mut other, shared.as_deref_mut());
                            resolved_items.push(other);
                        }
                    }
                }
                *items = resolved_items;
            }
            Value::Scalar(_) | Value::Substitution(_) => {}
        }
    }

    /// Resolves one substitution found during a walk, creating a fresh
    /// in-flight set when none is being threaded through.
    fn resolve_entry(
        &self,
        sub: &Substitution,
        shared: Option<&mut FxHashSet<u64>>,
    ) -> Option<Value> {
        match shared {
            Some(set) => self.resolve_sub(sub, set),
            None => {
                let mut set = FxHashSet::default();
                self.resolve_sub(sub, &mut set)
            }
        }
    }

    /// Resolves a whole substitution to its replacement value, or `None`
    /// when it produced nothing and its slot should be removed.
    fn resolve_sub(&self, sub: &Substitution, in_flight: &mut FxHashSet<u64>) -> Option<Value> {
        if !in_flight.insert(sub.id) {
            self.handler.error(
                ErrorKind::Resolution,
                format!(
                    "substitution cycle detected at '{}'",
                    join_path(&sub.container_path)
                ),
                Span::DUMMY,
            );
            return None;
        }
        let result = self.fold_pieces(sub, in_flight);
        in_flight.remove(&sub.id);
        result
    }

    /// Left-to-right accumulator fold over the pieces.
    fn fold_pieces(&self, sub: &Substitution, in_flight: &mut FxHashSet<u64>) -> Option<Value> {
        let mut acc: Option<Value> = None;
        for piece in &sub.pieces {
            match &piece.value {
                PieceValue::Inline(inline) => {
                    let mut copy = inline.clone();
                    self.resolve_node(&mut copy, Some(in_flight));
                    acc = self.combine(acc, copy, piece.interrupt, None);
                }
                PieceValue::Ref(path_ref) => {
                    match self.resolve_ref(path_ref, sub, in_flight) {
                        RefOutcome::Found(v) => {
                            acc = self.combine(
                                acc,
                                v,
                                piece.interrupt,
                                Some(path_ref.suffix_ws.as_str()),
                            );
                        }
                        RefOutcome::Skip => {}
                        RefOutcome::Fail => return acc,
                    }
                }
            }
        }
        acc
    }

    /// Resolves a single `${path}` reference.
    fn resolve_ref(
        &self,
        path_ref: &PathRef,
        sub: &Substitution,
        in_flight: &mut FxHashSet<u64>,
    ) -> RefOutcome {
        let self_ref = is_self_reference(&path_ref.path, &sub.container_path);

        let mut hit = self.stack_hit(self_ref, path_ref.counter, &path_ref.path);

        // Included substitutions were rebased onto the splice point;
        // retry with the prefix stripped before going to the
        // environment.
        let stripped: Option<&[String]> = sub.include_prefix.as_deref().and_then(|prefix| {
            if !prefix.is_empty()
                && is_path_prefix(prefix, &path_ref.path)
                && path_ref.path.len() > prefix.len()
            {
                Some(&path_ref.path[prefix.len()..])
            } else {
                None
            }
        });
        let mut effective: &[String] = &path_ref.path;
        if hit.is_none() {
            if let Some(sp) = stripped {
                hit = self.stack_hit(self_ref, path_ref.counter, sp);
                effective = sp;
            }
        }

        if let Some(entry) = hit {
            return match self.materialize(&entry.value, in_flight) {
                Some(v) => RefOutcome::Found(v),
                None => {
                    if path_ref.optional {
                        RefOutcome::Skip
                    } else {
                        self.report_unresolved(path_ref);
                        RefOutcome::Fail
                    }
                }
            };
        }

        // Environment fallback, by the path as written in its file.
        let env_name = join_path(effective);
        if let Some(value) = self.env.var(&env_name) {
            return RefOutcome::Found(Value::Scalar(Scalar::from_env_str(&value)));
        }

        if path_ref.optional {
            // A last look below the counter: an optional reference may
            // still pick up a value assigned before its substitution.
            if !self_ref {
                if let Some(counter) = path_ref.counter {
                    if let Some(entry) = self.stack.find_below(counter, &path_ref.path) {
                        if let Some(v) = self.materialize(&entry.value, in_flight) {
                            return RefOutcome::Found(v);
                        }
                    }
                }
            }
            return RefOutcome::Skip;
        }

        self.report_unresolved(path_ref);
        RefOutcome::Fail
    }

    fn stack_hit(
        &self,
        self_ref: bool,
        counter: Option<usize>,
        path: &[String],
    ) -> Option<&StackEntry> {
        if self_ref {
            counter.and_then(|c| self.stack.find_below(c, path))
        } else {
            self.stack.find_latest(path)
        }
    }

    /// Turns a stack snapshot into a resolved value: substitutions
    /// resolve recursively, containers get their nested substitutions
    /// resolved before they are combined into an accumulator.
    fn materialize(&self, snapshot: &Value, in_flight: &mut FxHashSet<u64>) -> Option<Value> {
        match snapshot {
            Value::Substitution(sub) => self.resolve_sub(sub, in_flight),
            other => {
                let mut copy = other.clone();
                self.resolve_node(&mut copy, Some(in_flight));
                Some(copy)
            }
        }
    }

    /// Folds one resolved piece into the accumulator.
    ///
    /// A reference that resolved to a scalar re-inserts the whitespace
    /// captured after it, so `"a ${x} b"` keeps its spacing.
    fn combine(
        &self,
        acc: Option<Value>,
        incoming: Value,
        interrupt: bool,
        suffix_ws: Option<&str>,
    ) -> Option<Value> {
        let incoming = match (incoming, suffix_ws) {
            (Value::Scalar(mut s), Some(ws)) if !ws.is_empty() => {
                s.append_whitespace(ws);
                Value::Scalar(s)
            }
            (v, _) => v,
        };

        let Some(current) = acc else {
            return Some(incoming);
        };

        Some(match (current, incoming, interrupt) {
            // Plain concatenation: the accumulator side wins object
            // conflicts.
            (Value::Object(mut a), Value::Object(b), false) => {
                a.merge(b, false);
                Value::Object(a)
            }
            // An interrupting object still merges, but the incoming
            // side wins: this is what a later `key = {..}` assignment
            // over a substitution means.
            (Value::Object(mut a), Value::Object(b), true) => {
                a.merge(b, true);
                Value::Object(a)
            }
            (Value::Array(mut a), Value::Array(b), false) => {
                a.extend(b);
                Value::Array(a)
            }
            (Value::Scalar(mut a), Value::Scalar(b), false) => {
                a.append(&b);
                Value::Scalar(a)
            }
            // Interrupt on any other kind replaces outright.
            (_, incoming, true) => incoming,
            (current, incoming, false) => {
                self.handler.error(
                    ErrorKind::Structural,
                    format!(
                        "substitution kind mismatch: cannot combine {} with {}",
                        current.kind_name(),
                        incoming.kind_name()
                    ),
                    Span::DUMMY,
                );
                current
            }
        })
    }

    fn report_unresolved(&self, path_ref: &PathRef) {
        self.handler.error(
            ErrorKind::Resolution,
            format!(
                "could not resolve substitution '${{{}}}'",
                join_path(&path_ref.path)
            ),
            Span::DUMMY,
        );
    }
}
