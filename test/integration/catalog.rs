// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

use anyhow::Result;
use indoc::indoc;
use lesson_mirror::{config::CatalogSettings, Backfiller, Catalog, Indexer};
use pretty_assertions::assert_eq;
use sealed_test::prelude::*;
use std::{
    fs::{create_dir_all, read_to_string, write},
    path::Path,
};

fn page(path: &str, html: &str) -> Result<()> {
    create_dir_all(path)?;
    write(Path::new(path).join("index.html"), html)?;
    Ok(())
}

#[sealed_test]
fn backfilled_descriptions_reach_catalog_after_reindex() -> Result<()> {
    page(
        "lessons/slides/unit-1-greetings",
        indoc! {r#"
            <!DOCTYPE html>
            <html>
              <head><title>ignored</title></head>
              <body>
                <nav><div></div></nav>
                <h1>Chào hỏi</h1>
                <p>Say hello and goodbye.</p>
              </body>
            </html>
        "#},
    )?;
    page("lessons/worksheets/week-1", "<html><body><img src=\"a.png\"></body></html>")?;
    page("lessons/games/memory", "<html><body><h1>Memory game</h1></body></html>")?;

    let settings = CatalogSettings::default();
    let indexer = Indexer::new(settings.clone());

    indexer.write("lessons")?;
    let before: Catalog = serde_json::from_str(&read_to_string("lessons/lessons.json")?)?;
    assert_eq!(before.lessons["slides/unit-1-greetings"].description, "Không có mô tả.");

    let summary = Backfiller::new(settings).run("lessons");
    assert_eq!(summary.updated, 2);

    indexer.write("lessons")?;
    let after: Catalog = serde_json::from_str(&read_to_string("lessons/lessons.json")?)?;

    let slides = &after.lessons["slides/unit-1-greetings"];
    assert_eq!(slides.title, "Unit 1 Greetings");
    assert_eq!(slides.description, "Chào hỏi");

    let worksheet = &after.lessons["worksheets/week-1"];
    assert_eq!(worksheet.description, "Bài tập bổ trợ cho học sinh.");

    // Games are indexed but never backfilled.
    let game = &after.lessons["games/memory"];
    assert_eq!(game.description, "Không có mô tả.");
    assert!(!Path::new("lessons/games/memory/info.txt").exists());

    let keys = after.categories.keys().cloned().collect::<Vec<_>>();
    assert_eq!(keys, vec!["games", "slides", "worksheets"]);

    Ok(())
}
