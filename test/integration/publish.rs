// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use crate::{require_git, RepoFixture, RepoKind};

use anyhow::Result;
use lesson_mirror::{
    config::CatalogSettings, publish::commit_message, Indexer, PublishOutcome, Publisher,
    SystemRunner,
};
use pretty_assertions::assert_eq;
use sealed_test::prelude::*;
use std::fs::write;

#[sealed_test]
fn clean_working_copy_publishes_nothing() -> Result<()> {
    require_git()?;

    let repo = RepoFixture::new("lessons", RepoKind::Normal)?;
    repo.commit_file("slides/unit-1/index.html", "<h1>Unit 1</h1>")?;
    let before = repo.head_message()?;

    let publisher = Publisher::new(SystemRunner, "git");
    let outcome = publisher.publish("lessons")?;

    assert_eq!(outcome, PublishOutcome::NothingToCommit);
    assert_eq!(repo.head_message()?, before);

    Ok(())
}

#[sealed_test]
fn catalog_and_changes_are_pushed_upstream() -> Result<()> {
    require_git()?;

    let remote = RepoFixture::new("remote.git", RepoKind::Bare)?;
    let repo = RepoFixture::new("lessons", RepoKind::Normal)?;
    repo.commit_file("slides/unit-1/index.html", "<h1>Unit 1</h1>")?;
    repo.track_upstream("remote.git")?;

    write("lessons/slides/unit-1/info.txt", "Title: Animals\n")?;
    Indexer::new(CatalogSettings::default()).write("lessons")?;

    let message = commit_message("2025-01-01_03-05-09");
    let publisher = Publisher::new(SystemRunner, "git");
    let outcome = publisher.publish_with_message("lessons", message.clone())?;

    assert_eq!(outcome, PublishOutcome::Pushed { message: message.clone() });
    assert_eq!(repo.head_message()?.trim_end(), message);
    assert_eq!(remote.head_message()?.trim_end(), message);

    // Second run finds nothing left to publish.
    assert_eq!(publisher.publish("lessons")?, PublishOutcome::NothingToCommit);

    Ok(())
}
