//! Source rendering for template classes.
//!
//! Renders a [`ClassDecl`] as Rust-flavoured source: a struct, an inherent
//! impl holding the constructor, and one impl block holding the methods for
//! the first implemented trait (or inherent when there is none). Unfilled
//! slots print as their markers, so unspecialized skeletons can be rendered
//! for inspection.

use std::fmt::Write;

use super::{ClassDecl, Expr, Method, Stmt, TypeRef};

/// Configuration for rendering.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Number of spaces for each indentation level.
    pub indent_width: usize,
    /// Whether to emit the package/template header comment.
    pub header: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            indent_width: 4,
            header: true,
        }
    }
}

/// Renders a class with the default configuration.
#[must_use]
pub fn render(class: &ClassDecl) -> String {
    render_with_config(class, &RenderConfig::default())
}

/// Renders a class with a custom configuration.
#[must_use]
pub fn render_with_config(class: &ClassDecl, config: &RenderConfig) -> String {
    let mut renderer = Renderer {
        config,
        output: String::new(),
        indent_level: 0,
    };
    renderer.class(class);
    renderer.output
}

struct Renderer<'a> {
    config: &'a RenderConfig,
    output: String,
    indent_level: usize,
}

impl Renderer<'_> {
    fn line(&mut self, text: &str) {
        if !text.is_empty() {
            let width = self.indent_level * self.config.indent_width;
            self.output.extend(std::iter::repeat_n(' ', width));
            self.output.push_str(text);
        }
        self.output.push('\n');
    }

    fn class(&mut self, class: &ClassDecl) {
        let name = class.name().to_string();

        if self.config.header {
            if let Some(package) = class.package() {
                self.line(&format!("// package {package}"));
            }
            self.line(&format!("// generated from {}", class.template_name()));
            self.line("");
        }

        if class.fields().is_empty() {
            self.line(&format!("pub struct {name};"));
        } else {
            self.line(&format!("pub struct {name} {{"));
            self.indent_level += 1;
            for field in class.fields() {
                self.line(&format!("{}: {},", field.name, field.ty));
            }
            self.indent_level -= 1;
            self.line("}");
        }

        if let Some(constructor) = class.constructor() {
            self.line("");
            self.line(&format!("impl {name} {{"));
            self.indent_level += 1;
            self.method(constructor, true);
            self.indent_level -= 1;
            self.line("}");
        }

        if !class.methods().is_empty() {
            self.line("");
            match class.implements().first() {
                Some(tr) => self.line(&format!("impl {tr} for {name} {{")),
                None => self.line(&format!("impl {name} {{")),
            }
            self.indent_level += 1;
            let public = class.implements().is_empty();
            for (i, method) in class.methods().iter().enumerate() {
                if i > 0 {
                    self.line("");
                }
                self.method(method, public);
            }
            self.indent_level -= 1;
            self.line("}");
        }
    }

    fn method(&mut self, method: &Method, public: bool) {
        let mut params: Vec<String> = Vec::new();
        if method.receiver {
            params.push("&self".to_string());
        }
        params.extend(method.params.iter().map(|p| format!("{}: {}", p.name, p.ty)));

        let mut signature = String::new();
        if public {
            signature.push_str("pub ");
        }
        let _ = write!(signature, "fn {}({})", method.name, params.join(", "));
        if let Some(ret) = &method.returns {
            let _ = write!(signature, " -> {ret}");
        }

        if method.body.is_empty() {
            self.line(&format!("{signature} {{}}"));
            return;
        }

        self.line(&format!("{signature} {{"));
        self.indent_level += 1;
        for stmt in &method.body {
            match stmt {
                Stmt::Expr(e) => self.line(&format!("{};", expr(e))),
                Stmt::Return(e) => self.line(&expr(e)),
            }
        }
        self.indent_level -= 1;
        self.line("}");
    }
}

fn args(args: &[Expr]) -> String {
    args.iter().map(expr).collect::<Vec<_>>().join(", ")
}

/// Renders an expression on one line.
pub(crate) fn expr(e: &Expr) -> String {
    match e {
        Expr::Name(n) => n.clone(),
        Expr::Str(s) => format!("{s:?}"),
        Expr::SelfRef => "self".to_string(),
        Expr::Call {
            target: Some(t),
            method,
            args: a,
        } => format!("{}.{method}({})", expr(t), args(a)),
        Expr::Call {
            target: None,
            method,
            args: a,
        } => format!("{method}({})", args(a)),
        Expr::New { ty, args: a } => format!("{}::new({})", path(ty), args(a)),
        Expr::Init { ty, fields } => {
            let fields = fields
                .iter()
                .map(|(n, e)| match e {
                    Expr::Name(v) if v == n => n.clone(),
                    _ => format!("{n}: {}", expr(e)),
                })
                .collect::<Vec<_>>()
                .join(", ");
            format!("{} {{ {fields} }}", path(ty))
        }
    }
}

/// Type in expression position: generic arguments need a turbofish.
fn path(ty: &TypeRef) -> String {
    match ty {
        TypeRef::Generic(name, a) => {
            let a = a.iter().map(ToString::to_string).collect::<Vec<_>>();
            format!("{name}::<{}>", a.join(", "))
        }
        other => other.to_string(),
    }
}
