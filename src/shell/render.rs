//! Plain-text rendering of every screen.

use crate::controllers::configurations::Activation;
use crate::controllers::verification::{Phase, VerificationView};
use crate::controllers::Notice;
use crate::models::configuration::Configuration;
use crate::models::document::AnalyzedDocument;
use crate::models::job::JobStatus;
use crate::models::prompt::Prompt;
use crate::shell::{GuestLinks, View};

const TASKS_PREVIEW_CHARS: usize = 60;

/// `0.92` → `"92.0%"`.
pub fn format_confidence(confidence: f64) -> String {
    format!("{:.1}%", confidence * 100.0)
}

/// Ten-cell bar: high (> 0.7), medium (> 0.4) or low confidence.
pub fn confidence_bar(confidence: f64) -> String {
    let filled = (confidence.clamp(0.0, 1.0) * 10.0).round() as usize;
    let level = if confidence > 0.7 {
        "high"
    } else if confidence > 0.4 {
        "medium"
    } else {
        "low"
    };
    format!("[{}{}] {level}", "#".repeat(filled), "-".repeat(10 - filled))
}

fn truncate(text: &str, max: usize) -> String {
    let single_line = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if single_line.chars().count() <= max {
        return single_line;
    }
    let cut: String = single_line.chars().take(max.saturating_sub(3)).collect();
    format!("{cut}...")
}

/// Left-aligned table with a header rule.
pub fn table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }

    let line = |cells: Vec<&str>| {
        cells
            .iter()
            .zip(&widths)
            .map(|(cell, &width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = vec![line(headers.to_vec())];
    out.push(
        widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>()
            .join("  "),
    );
    out.extend(rows.iter().map(|row| line(row.iter().map(String::as_str).collect())));
    out.join("\n")
}

pub fn render_notice(notice: Option<&Notice>) -> Option<String> {
    notice.map(|n| format!("[{}] {}", n.severity, n.message))
}

pub fn render_guest(links: &GuestLinks) -> String {
    [
        "Fraud Detection Platform".to_string(),
        "You are not signed in.".to_string(),
        String::new(),
        format!("Sign in:         {}", links.sign_in),
        format!("Create account:  {}", links.sign_up),
        format!("Forgot password: {}", links.forgot_password),
    ]
    .join("\n")
}

pub fn render_dashboard(username: Option<&str>) -> String {
    let mut out = vec!["Fraud Detection Platform".to_string()];
    if let Some(name) = username {
        out.push(format!("Signed in as {name}"));
    }
    out.push(
        "Welcome to the Fraud Detection and Prevention Platform. Use the tools below to analyze \
         and verify documents."
            .to_string(),
    );
    out.push(String::new());
    for view in View::features() {
        out.push(format!("  {:<14} {}", view.to_string(), view.title()));
        out.push(format!("  {:<14} {}", "", view.description()));
    }
    out.join("\n")
}

pub fn render_documents(documents: &[AnalyzedDocument]) -> String {
    if documents.is_empty() {
        return "No analyzed documents yet.".to_string();
    }
    let rows: Vec<Vec<String>> = documents
        .iter()
        .map(|d| {
            vec![
                d.id.clone().unwrap_or_default(),
                d.timestamp.clone().unwrap_or_default(),
                d.document_type.clone().unwrap_or_else(|| "Unknown".to_string()),
                d.confidence.map(format_confidence).unwrap_or_else(|| "-".to_string()),
            ]
        })
        .collect();
    table(&["ID", "Timestamp", "Document Type", "Confidence"], &rows)
}

pub fn render_document(document: &AnalyzedDocument) -> String {
    let mut out = vec![
        format!("Document Type: {}", document.document_type.as_deref().unwrap_or("Unknown")),
        format!(
            "Confidence:    {}",
            document.confidence.map(format_confidence).unwrap_or_else(|| "-".to_string())
        ),
    ];
    if let Some(url) = &document.preview_url {
        out.push(format!("Preview:       {url}"));
    }
    if let Some(text) = &document.content_text {
        out.push(String::new());
        out.push(text.clone());
    }
    out.join("\n")
}

pub fn render_prompts(prompts: &[Prompt]) -> String {
    if prompts.is_empty() {
        return "No prompts found. Add a new prompt to get started.".to_string();
    }
    let rows: Vec<Vec<String>> = prompts
        .iter()
        .map(|p| {
            vec![
                p.key().unwrap_or("-").to_string(),
                truncate(&p.role, 30),
                truncate(&p.tasks, TASKS_PREVIEW_CHARS),
                if p.is_active { "yes" } else { "no" }.to_string(),
            ]
        })
        .collect();
    table(&["ID", "Role", "Tasks", "Active"], &rows)
}

pub fn render_prompt(prompt: &Prompt) -> String {
    [
        format!("ID:     {}", prompt.key().unwrap_or("-")),
        format!("Active: {}", if prompt.is_active { "yes" } else { "no" }),
        String::new(),
        "Role:".to_string(),
        prompt.role.clone(),
        String::new(),
        "Tasks:".to_string(),
        prompt.tasks.clone(),
    ]
    .join("\n")
}

pub fn render_configurations(
    models: &[Configuration],
    inference: &[Configuration],
    activation: &Activation,
) -> String {
    let model_rows: Vec<Vec<String>> = models
        .iter()
        .map(|c| {
            let pending = matches!(activation, Activation::Pending { sk } if *sk == c.sk);
            vec![
                c.sk.clone(),
                c.value.clone(),
                c.description.clone().unwrap_or_default(),
                match (c.is_active, pending) {
                    (_, true) => "pending".to_string(),
                    (true, _) => "yes".to_string(),
                    _ => "no".to_string(),
                },
            ]
        })
        .collect();
    let param_rows: Vec<Vec<String>> = inference
        .iter()
        .map(|c| vec![c.sk.clone(), c.value.clone(), c.description.clone().unwrap_or_default()])
        .collect();

    let mut out = vec![
        "Model IDs".to_string(),
        table(&["Key", "Value", "Description", "Active"], &model_rows),
        String::new(),
        "Inference Parameters".to_string(),
        table(&["Key", "Value", "Description"], &param_rows),
    ];
    if let Activation::RolledBack { sk, error } = activation {
        out.push(String::new());
        out.push(format!("Activation of {sk} was rolled back: {error}"));
    }
    out.join("\n")
}

pub fn render_verification(view: &VerificationView) -> String {
    let mut out = Vec::new();

    match (&view.job_id, &view.image) {
        (Some(id), _) => out.push(format!("Verification ID: {id}")),
        (None, Some(image)) => out.push(format!("Selected: {} ({} bytes)", image.file_name, image.size)),
        (None, None) => out.push("Select a document image to verify.".to_string()),
    }
    if let Some(preview) = view.preview().filter(|p| !p.starts_with("data:")) {
        out.push(format!("Preview: {preview}"));
    }
    if view.phase == Phase::Submitting {
        out.push("Submitting document...".to_string());
    }
    if let Some(error) = &view.last_error {
        out.push(format!("[error] {error}"));
    }

    let Some(job) = &view.job else {
        if view.phase == Phase::Polling {
            out.push("Waiting for the first status update...".to_string());
        }
        return out.join("\n");
    };

    out.push(String::new());
    out.push("Verification Summary".to_string());
    out.push(format!("  Status:        {}", job.status));
    out.push(format!(
        "  Document Type: {}",
        job.document_type.as_deref().filter(|t| !t.is_empty()).unwrap_or("Unknown")
    ));
    if let Some(confidence) = job.confidence {
        out.push(format!(
            "  Confidence:    {} {}",
            format_confidence(confidence),
            confidence_bar(confidence)
        ));
    }
    if let Some(summary) = &job.result_summary {
        out.push(format!("  Summary:       {summary}"));
    }
    if job.status == JobStatus::InProgress {
        out.push("Verification in progress...".to_string());
    }

    out.push(String::new());
    if job.steps.is_empty() {
        out.push("No verification steps available yet.".to_string());
    } else {
        out.push("Verification Steps".to_string());
        for step in &job.steps {
            out.push(format!("  [{}] {} - {}", step.step_id, step.name, step.status));
            if !step.description.is_empty() {
                out.push(format!("      {}", step.description));
            }
            if let Some(confidence) = step.confidence {
                out.push(format!(
                    "      Confidence: {} {}",
                    format_confidence(confidence),
                    confidence_bar(confidence)
                ));
            }
            if let Some(details) = &step.details {
                let pretty = serde_json::to_string_pretty(details).unwrap_or_default();
                out.extend(pretty.lines().map(|l| format!("      {l}")));
            }
        }
    }

    if let Some(prompt) = view.needs_info_prompt() {
        out.push(String::new());
        out.push("Additional Information Needed".to_string());
        out.push(format!("  {prompt}"));
    }
    out.join("\n")
}
