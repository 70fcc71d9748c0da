//! The `quizline characters` command.

use anyhow::Result;
use comfy_table::{Cell, Table};

use quizline_core::model::Character;

pub fn execute() -> Result<()> {
    let mut table = Table::new();
    table.set_header(vec!["Character", "Power", "Effect"]);

    for character in Character::ALL {
        let power = character.power();
        table.add_row(vec![
            Cell::new(character.label()),
            Cell::new(power.name()),
            Cell::new(power.description()),
        ]);
    }

    println!("{table}");
    println!("\nEach power can be used once per quiz. Pick one with `quizline play --character <name>`.");
    Ok(())
}
