//! HtmlFormEngine - 宣言済みフィールドから `<form>` を生成するエンジン
//!
//! - 1 フィールド = 1 input（enum は select、boolean は checkbox）
//! - required / readonly validator は HTML 属性に写す
//! - 値とラベルはすべて HTML エスケープする

use std::fmt::Write as _;

use crate::domain::{Constraint, FieldType, FormData, FormError, FormField};
use crate::ports::{FormEngine, RenderedForm};

pub const HTML_ENGINE_NAME: &str = "html";

#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlFormEngine;

impl HtmlFormEngine {
    pub fn new() -> Self {
        Self
    }
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn attributes(field: &FormField) -> String {
    let mut attrs = String::new();
    for constraint in &field.validators {
        match constraint {
            Constraint::Required => attrs.push_str(" required"),
            Constraint::Readonly => attrs.push_str(" readonly"),
            Constraint::MinLength(n) => {
                let _ = write!(attrs, " minlength=\"{n}\"");
            }
            Constraint::MaxLength(n) => {
                let _ = write!(attrs, " maxlength=\"{n}\"");
            }
            Constraint::Min(n) => {
                let _ = write!(attrs, " min=\"{n}\"");
            }
            Constraint::Max(n) => {
                let _ = write!(attrs, " max=\"{n}\"");
            }
        }
    }
    attrs
}

fn render_field(out: &mut String, field: &FormField) {
    let name = escape(&field.name);
    let label = escape(field.label.as_deref().unwrap_or(&field.name));
    let value = field
        .value
        .as_ref()
        .map(|v| escape(&v.display_text()))
        .unwrap_or_default();
    let attrs = attributes(field);

    let _ = writeln!(out, "  <div class=\"form-group\">");
    let _ = writeln!(out, "    <label for=\"{name}\">{label}</label>");
    match &field.field_type {
        Some(FieldType::Boolean) => {
            let checked = if value == "true" { " checked" } else { "" };
            let _ = writeln!(
                out,
                "    <input type=\"checkbox\" id=\"{name}\" name=\"{name}\"{checked}{attrs}>"
            );
        }
        Some(FieldType::Enum { values }) => {
            let _ = writeln!(out, "    <select id=\"{name}\" name=\"{name}\"{attrs}>");
            for option in values {
                let id = escape(&option.id);
                let selected = if id == value { " selected" } else { "" };
                let _ = writeln!(
                    out,
                    "      <option value=\"{id}\"{selected}>{}</option>",
                    escape(&option.name)
                );
            }
            let _ = writeln!(out, "    </select>");
        }
        other => {
            let input_type = match other {
                Some(FieldType::Long) | Some(FieldType::Double) => "number",
                _ => "text",
            };
            let _ = writeln!(
                out,
                "    <input type=\"{input_type}\" id=\"{name}\" name=\"{name}\" value=\"{value}\"{attrs}>"
            );
        }
    }
    let _ = writeln!(out, "  </div>");
}

impl FormEngine for HtmlFormEngine {
    fn name(&self) -> &str {
        HTML_ENGINE_NAME
    }

    /// 宣言済みフィールドのみ描画する（undeclared な変数は出さない）
    fn render(&self, form: &FormData) -> Result<RenderedForm, FormError> {
        let mut body = String::new();
        match &form.form_key {
            Some(key) => {
                let _ = writeln!(body, "<form name=\"{}\">", escape(key));
            }
            None => body.push_str("<form>\n"),
        }
        for field in form.declared_fields() {
            render_field(&mut body, field);
        }
        body.push_str("</form>\n");
        Ok(RenderedForm {
            engine: HTML_ENGINE_NAME.to_string(),
            content_type: "text/html".to_string(),
            body,
        })
    }
}
