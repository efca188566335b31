//! The data a presentation layer needs to draw a form, resolved from the
//! schema, the current values and the visible errors.

use crate::ast::Value;
use crate::controller::{StageController, StageStatus};
use crate::engine::FormEngine;
use crate::schema::{Field, FieldPath, GroupField, InputType, Node, Section};
use crate::store::ValueTree;
use crate::validator::ErrorMap;
use itertools::Itertools;
use serde::Serialize;
use std::fmt::Write;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormView {
    pub name: String,
    pub description: Option<String>,
    pub show_stage_names: bool,
    pub progress: Vec<ProgressStep>,
    /// `None` only for a form without stages.
    pub stage: Option<StageView>,
    pub is_last_stage: bool,
}

/// How a progress indicator shows a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepState {
    Current,
    Complete,
    Incomplete,
    Untouched,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressStep {
    pub index: usize,
    pub title: String,
    pub state: StepState,
    pub clickable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageView {
    pub index: usize,
    pub name: String,
    pub title: String,
    pub blocks: Vec<BlockView>,
}

/// Sections are kept as labelled blocks for layout.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BlockView {
    Field(FieldView),
    Group(GroupView),
    Section(SectionView),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionView {
    pub name: String,
    pub label: Option<String>,
    pub blocks: Vec<BlockView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupView {
    pub name: String,
    pub label: Option<String>,
    pub hidden: bool,
    pub fields: Vec<FieldView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldView {
    #[serde(serialize_with = "serialize_path")]
    pub path: FieldPath,
    /// `None` when the label is hidden.
    pub label: Option<String>,
    pub input_type: InputType,
    pub value: Value,
    pub options: Vec<String>,
    pub error: Option<String>,
    pub required: bool,
    pub disabled: bool,
    pub read_only: bool,
    pub hidden: bool,
    pub multi_select: bool,
    pub placeholder: Option<String>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub step: Option<f64>,
    pub left_icon: Option<String>,
    pub right_icon: Option<String>,
}

fn serialize_path<S: serde::Serializer>(
    path: &FieldPath,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(path)
}

/// Presentation layers implement this to draw a [`FormView`].
pub trait Renderer {
    type Output;
    fn render(&mut self, view: &FormView) -> Self::Output;
}

impl FormView {
    pub(crate) fn build(
        engine: &FormEngine,
        values: &ValueTree,
        controller: &StageController,
        errors: &ErrorMap,
    ) -> Self {
        let form = engine.form();
        let current = controller.current();

        let progress = form
            .stages
            .iter()
            .enumerate()
            .map(|(index, stage)| ProgressStep {
                index,
                title: stage.title(),
                state: match controller.status(index) {
                    _ if index == current => StepState::Current,
                    Some(StageStatus::Complete) => StepState::Complete,
                    Some(StageStatus::Incomplete) => StepState::Incomplete,
                    Some(StageStatus::Untouched) | None => StepState::Untouched,
                },
                clickable: controller.can_jump_to(index),
            })
            .collect();

        let builder = ViewBuilder {
            engine,
            values,
            errors,
        };
        let stage = form.stage(current).map(|stage| StageView {
            index: current,
            name: stage.name.clone(),
            title: stage.title(),
            blocks: builder.blocks(&stage.fields),
        });

        FormView {
            name: form.name.clone(),
            description: form.description.clone(),
            show_stage_names: form.show_stage_names,
            progress,
            stage,
            is_last_stage: controller.is_last_stage(),
        }
    }
}

struct ViewBuilder<'a> {
    engine: &'a FormEngine,
    values: &'a ValueTree,
    errors: &'a ErrorMap,
}

impl ViewBuilder<'_> {
    fn blocks(&self, nodes: &[Node]) -> Vec<BlockView> {
        nodes
            .iter()
            .map(|node| match node {
                Node::Field(field) => BlockView::Field(self.field(field, None)),
                Node::Group(group) => BlockView::Group(self.group(group)),
                Node::Section(section) => BlockView::Section(self.section(section)),
            })
            .collect()
    }

    fn section(&self, section: &Section) -> SectionView {
        SectionView {
            name: section.name.clone(),
            label: section.label.clone(),
            blocks: self.blocks(&section.fields),
        }
    }

    fn group(&self, group: &GroupField) -> GroupView {
        GroupView {
            name: group.name.clone(),
            label: (!group.hidden_label).then(|| group.display_label()),
            hidden: group.is_hidden,
            fields: group
                .fields
                .iter()
                .map(|field| self.field(field, Some(&group.name)))
                .collect(),
        }
    }

    fn field(&self, field: &Field, group: Option<&str>) -> FieldView {
        let path = FieldPath::within(group, &field.name);
        let label = field.display_label();
        let placeholder = field.placeholder.clone().or_else(|| {
            field
                .input_type
                .is_choice()
                .then(|| format!("Select {}...", label.to_lowercase()))
        });

        FieldView {
            value: self.values.get(&path).cloned().unwrap_or_else(Value::empty),
            options: self.engine.resolve_options(field, group, self.values),
            error: self.errors.get(&path).cloned(),
            required: field.required,
            disabled: self.engine.is_disabled(field, group, self.values),
            read_only: field.is_read_only || field.is_computed(),
            hidden: field.is_hidden,
            multi_select: field.is_multi_select || field.input_type == InputType::Multiselect,
            placeholder,
            label: (!field.hidden_label).then_some(label),
            input_type: field.input_type,
            min: field.min,
            max: field.max,
            step: field.step,
            left_icon: field.left_icon.clone(),
            right_icon: field.right_icon.clone(),
            path,
        }
    }
}

/// Renders a view as indented plain text, one line per control.
#[derive(Debug, Default)]
pub struct PlainTextRenderer;

impl Renderer for PlainTextRenderer {
    type Output = String;

    fn render(&mut self, view: &FormView) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "== {} ==", view.name);
        if let Some(description) = &view.description {
            let _ = writeln!(out, "{}", description);
        }
        if view.show_stage_names && !view.progress.is_empty() {
            let steps = view
                .progress
                .iter()
                .map(|step| {
                    let marker = match step.state {
                        StepState::Current => ">",
                        StepState::Complete => "+",
                        StepState::Incomplete => "!",
                        StepState::Untouched => " ",
                    };
                    format!("[{}] {}. {}", marker, step.index + 1, step.title)
                })
                .join("  ");
            let _ = writeln!(out, "{}", steps);
        }
        if let Some(stage) = &view.stage {
            let _ = writeln!(out, "-- {} --", stage.title);
            render_blocks(&mut out, &stage.blocks, 1);
        }
        out
    }
}

fn render_blocks(out: &mut String, blocks: &[BlockView], depth: usize) {
    let indent = "  ".repeat(depth);
    for block in blocks {
        match block {
            BlockView::Field(field) => render_field(out, field, &indent),
            BlockView::Group(group) if group.hidden => {}
            BlockView::Group(group) => {
                let label = group.label.as_deref().unwrap_or(&group.name);
                let _ = writeln!(out, "{}{}:", indent, label);
                let inner = "  ".repeat(depth + 1);
                for field in &group.fields {
                    render_field(out, field, &inner);
                }
            }
            BlockView::Section(section) => {
                if let Some(label) = &section.label {
                    let _ = writeln!(out, "{}# {}", indent, label);
                }
                render_blocks(out, &section.blocks, depth + 1);
            }
        }
    }
}

fn render_field(out: &mut String, field: &FieldView, indent: &str) {
    if field.hidden {
        return;
    }
    let label = field.label.clone().unwrap_or_else(|| field.path.to_string());
    let marker = if field.required { "*" } else { "" };
    let _ = write!(
        out,
        "{}{}{} = {:?}",
        indent,
        label,
        marker,
        field.value.display_text()
    );
    if field.disabled {
        let _ = write!(out, " (disabled)");
    }
    if !field.options.is_empty() {
        let _ = write!(out, " [{}]", field.options.join(" | "));
    }
    if let Some(error) = &field.error {
        let _ = write!(out, "  <- {}", error);
    }
    out.push('\n');
}
