//! One-shot subcommands that print to stdout instead of starting the chat UI.

use std::io::Write;

use anyhow::{anyhow, bail, Context};
use mail_backend::{AnswerRequest, EmailQuery, MailBackend, NewEmail};

use crate::cli::Commands;
use crate::format;

/// Bodies longer than this are accepted but flagged.
pub const RECOMMENDED_MAX_BODY_CHARS: usize = 50_000;

/// Runs `command` against `backend`. `read_body` supplies the ingest body when no file is given.
pub fn run(
    command: Commands,
    backend: &dyn MailBackend,
    read_body: impl FnOnce() -> std::io::Result<String>,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> anyhow::Result<()> {
    match command {
        Commands::Ask { question } => ask(backend, &question, out),
        Commands::Ingest {
            sender,
            subject,
            file,
        } => {
            let body = match file {
                Some(path) => std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read {}", path.display()))?,
                None => read_body().context("failed to read email body from stdin")?,
            };
            let mut email = NewEmail::new(body);
            if let Some(sender) = sender {
                email = email.with_sender(sender);
            }
            if let Some(subject) = subject {
                email = email.with_subject(subject);
            }
            ingest(backend, email, out, err)
        }
        Commands::Emails {
            category,
            limit,
            offset,
        } => {
            let mut query = EmailQuery::new().with_limit(limit).with_offset(offset);
            if let Some(category) = category {
                query = query.with_category(category);
            }
            let emails = backend.emails(&query).map_err(|error| anyhow!(error))?;
            write_lines(out, &format::email_list_lines(&emails))
        }
        Commands::Email { id } => {
            let email = backend.email(id).map_err(|error| anyhow!(error))?;
            write_lines(out, &format::email_detail_lines(&email))
        }
        Commands::Categories => {
            let categories = backend.categories().map_err(|error| anyhow!(error))?;
            write_lines(out, &format::category_lines(&categories))
        }
        Commands::Recategorize { id, category } => {
            backend
                .recategorize(id, &category)
                .map_err(|error| anyhow!(error))?;
            writeln!(out, "#{id} 카테고리를 '{}'(으)로 변경했습니다.", category.trim())?;
            Ok(())
        }
        Commands::Delete { id } => {
            backend.delete(id).map_err(|error| anyhow!(error))?;
            writeln!(out, "#{id} 메일을 삭제했습니다.")?;
            Ok(())
        }
        Commands::CategoryAdd { name, description } => {
            let category = backend
                .add_category(&name, description.as_deref())
                .map_err(|error| anyhow!(error))?;
            writeln!(out, "카테고리 #{} '{}'을(를) 추가했습니다.", category.id, category.name)?;
            Ok(())
        }
        Commands::CategoryRename { id, name } => {
            let category = backend
                .rename_category(id, &name)
                .map_err(|error| anyhow!(error))?;
            writeln!(out, "카테고리 #{id} 이름을 '{}'(으)로 변경했습니다.", category.name)?;
            Ok(())
        }
        Commands::CategoryDelete { id } => {
            backend.delete_category(id).map_err(|error| anyhow!(error))?;
            writeln!(out, "카테고리 #{id}을(를) 삭제했습니다. 해당 메일은 '미분류'로 이동했습니다.")?;
            Ok(())
        }
    }
}

fn ask(backend: &dyn MailBackend, question: &str, out: &mut dyn Write) -> anyhow::Result<()> {
    let question = question.trim();
    if question.is_empty() {
        bail!("question must not be blank");
    }

    let answer = backend
        .ask(AnswerRequest {
            request_id: 1,
            question: question.to_string(),
            chat_history: Vec::new(),
        })
        .map_err(|error| anyhow!(error))
        .context("answer request failed")?;

    writeln!(out, "{}", answer.answer)?;
    if !answer.sources.is_empty() {
        writeln!(out)?;
        writeln!(out, "참고한 메일")?;
        for source in &answer.sources {
            writeln!(out, "- {}", format::evidence_heading(source))?;
            writeln!(out, "  {}", source.summary)?;
        }
    }
    Ok(())
}

fn ingest(
    backend: &dyn MailBackend,
    email: NewEmail,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> anyhow::Result<()> {
    if email.is_blank() {
        bail!("email body must not be blank");
    }

    let chars = email.body.chars().count();
    if chars > RECOMMENDED_MAX_BODY_CHARS {
        tracing::warn!(chars, "ingesting an unusually long email body");
        writeln!(
            err,
            "경고: 내용이 너무 깁니다 ({chars}자, 50,000자 권장). 앞부분만 분석될 수 있습니다."
        )?;
    }

    let record = backend.ingest(email).map_err(|error| anyhow!(error))?;
    writeln!(out, "#{} [{}] {}", record.id, record.category, record.subject_label())?;
    writeln!(out, "요약: {}", record.summary)?;
    Ok(())
}

fn write_lines(out: &mut dyn Write, lines: &[String]) -> anyhow::Result<()> {
    for line in lines {
        writeln!(out, "{line}")?;
    }
    Ok(())
}
