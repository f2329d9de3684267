//! The `levels`, `subjects`, `topics` and `question-types` commands.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use examprep_core::catalog::Catalog;
use examprep_core::model::RecordId;

fn open(config_path: Option<PathBuf>) -> Result<Catalog> {
    let config = examprep_providers::load_config_from(config_path.as_deref())?;
    Ok(Catalog::new(config.create_store()?))
}

pub async fn levels(config_path: Option<PathBuf>) -> Result<()> {
    let levels = open(config_path)?.levels().await?;

    let mut table = Table::new();
    table.set_header(vec!["ID", "Level"]);
    for level in &levels {
        table.add_row(vec![Cell::new(&level.id), Cell::new(&level.level)]);
    }
    println!("{table}");
    Ok(())
}

pub async fn subjects(level: RecordId, config_path: Option<PathBuf>) -> Result<()> {
    let subjects = open(config_path)?.subjects_by_level(&level).await?;
    if subjects.is_empty() {
        println!("No subjects for level {level}.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Subject"]);
    for subject in &subjects {
        table.add_row(vec![Cell::new(&subject.id), Cell::new(&subject.subject_name)]);
    }
    println!("{table}");
    Ok(())
}

pub async fn topics(subject: RecordId, config_path: Option<PathBuf>) -> Result<()> {
    let topics = open(config_path)?.topics_by_subject(&subject).await?;
    if topics.is_empty() {
        println!("No topics for subject {subject}.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Topic"]);
    for topic in &topics {
        table.add_row(vec![Cell::new(&topic.id), Cell::new(&topic.topic_name)]);
    }
    println!("{table}");
    Ok(())
}

pub async fn question_types(config_path: Option<PathBuf>) -> Result<()> {
    let types = open(config_path)?.question_types().await?;

    let mut table = Table::new();
    table.set_header(vec!["ID", "Type"]);
    for question_type in &types {
        table.add_row(vec![
            Cell::new(&question_type.id),
            Cell::new(&question_type.type_name),
        ]);
    }
    println!("{table}");
    Ok(())
}
