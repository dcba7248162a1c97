//! Typed AppleScript builder.
//!
//! Caller-supplied strings can only enter a script through [`Expr::Str`] or a
//! [`Target`] name, both of which are escaped when the script is rendered.
//! Everything else is a `&'static str` fragment of the fixed command vocabulary.

use std::fmt::{self, Display, Write};

const INDENT: &str = "  ";

/// Escape `value` for use inside a double-quoted AppleScript string literal.
///
/// Not idempotent: escaping twice doubles the backslashes. The builder applies
/// it exactly once, at render time.
pub fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Untrusted text, rendered as an escaped string literal.
    Str(String),
    Int(i64),
    Num(f64),
    /// Script variable or property reference, e.g. `nn` or `id of nb`.
    Code(&'static str),
    /// `(verb arg)`, e.g. `(fetch note "id")`.
    Call(&'static str, Box<Expr>),
    /// `(lhs contains rhs)`
    Contains(Box<Expr>, Box<Expr>),
}

impl Expr {
    pub fn str(value: impl Into<String>) -> Self {
        Expr::Str(value.into())
    }

    pub fn call(verb: &'static str, arg: Expr) -> Self {
        Expr::Call(verb, Box::new(arg))
    }

    pub fn contains(lhs: Expr, rhs: Expr) -> Self {
        Expr::Contains(Box::new(lhs), Box::new(rhs))
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Str(s) => write!(f, "\"{}\"", escape(s)),
            Expr::Int(i) => write!(f, "{i}"),
            Expr::Num(n) => write!(f, "{n}"),
            Expr::Code(c) => f.write_str(c),
            Expr::Call(verb, arg) => write!(f, "({verb} {arg})"),
            Expr::Contains(lhs, rhs) => write!(f, "({lhs} contains {rhs})"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Target {
    Application(String),
    Process(String),
}

impl Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Application(name) => write!(f, "application \"{}\"", escape(name)),
            Target::Process(name) => write!(f, "process \"{}\"", escape(name)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// `tell <target> ... end tell`, or `tell <target> to <stmt>` when the body
    /// is a single simple statement.
    Tell { target: Target, body: Vec<Stmt> },
    If { cond: Expr, then: Vec<Stmt> },
    Set { target: &'static str, value: Expr },
    /// `verb [arg] [params]`, e.g. `append text comment "x" target note nn`.
    Command {
        verb: &'static str,
        arg: Option<Expr>,
        params: &'static str,
    },
    Return(Expr),
}

impl Stmt {
    pub fn tell_app(name: impl Into<String>, body: Vec<Stmt>) -> Self {
        Stmt::Tell {
            target: Target::Application(name.into()),
            body,
        }
    }

    pub fn tell_process(name: impl Into<String>, body: Vec<Stmt>) -> Self {
        Stmt::Tell {
            target: Target::Process(name.into()),
            body,
        }
    }

    pub fn cmd(verb: &'static str) -> Self {
        Stmt::Command {
            verb,
            arg: None,
            params: "",
        }
    }

    pub fn cmd_arg(verb: &'static str, arg: Expr) -> Self {
        Stmt::Command {
            verb,
            arg: Some(arg),
            params: "",
        }
    }

    pub fn cmd_to(verb: &'static str, arg: Expr, params: &'static str) -> Self {
        Stmt::Command {
            verb,
            arg: Some(arg),
            params,
        }
    }

    pub fn set(target: &'static str, value: Expr) -> Self {
        Stmt::Set { target, value }
    }

    fn is_simple(&self) -> bool {
        matches!(self, Stmt::Set { .. } | Stmt::Command { .. } | Stmt::Return(_))
    }

    fn write_inline(&self, out: &mut String) -> fmt::Result {
        match self {
            Stmt::Set { target, value } => write!(out, "set {target} to {value}"),
            Stmt::Command { verb, arg, params } => {
                out.push_str(verb);
                if let Some(arg) = arg {
                    write!(out, " {arg}")?;
                }
                if !params.is_empty() {
                    write!(out, " {params}")?;
                }
                Ok(())
            }
            Stmt::Return(expr) => write!(out, "return {expr}"),
            Stmt::Tell { .. } | Stmt::If { .. } => unreachable!("block statement rendered inline"),
        }
    }

    fn write(&self, out: &mut String, depth: usize) -> fmt::Result {
        let pad = INDENT.repeat(depth);
        match self {
            Stmt::Tell { target, body } if body.len() == 1 && body[0].is_simple() => {
                write!(out, "{pad}tell {target} to ")?;
                body[0].write_inline(out)?;
                out.push('\n');
            }
            Stmt::Tell { target, body } => {
                writeln!(out, "{pad}tell {target}")?;
                for stmt in body {
                    stmt.write(out, depth + 1)?;
                }
                writeln!(out, "{pad}end tell")?;
            }
            Stmt::If { cond, then } => {
                writeln!(out, "{pad}if {cond} then")?;
                for stmt in then {
                    stmt.write(out, depth + 1)?;
                }
                writeln!(out, "{pad}end if")?;
            }
            simple => {
                out.push_str(&pad);
                simple.write_inline(out)?;
                out.push('\n');
            }
        }
        Ok(())
    }
}

/// An ordered list of top-level statements.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Script {
    stmts: Vec<Stmt>,
}

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(mut self, stmt: Stmt) -> Self {
        self.stmts.push(stmt);
        self
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for stmt in &self.stmts {
            // Writing into a String cannot fail.
            let _ = stmt.write(&mut out, 0);
        }
        out
    }
}
