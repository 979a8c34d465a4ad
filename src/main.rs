use minesweeper_agent::{Agent, Board, Cell};
use std::thread;
use std::time::Duration;

fn main() -> anyhow::Result<()> {
    // --- 1. Initialization ---
    let (height, width, mine_count) = (8, 8, 8);
    let mut rng = rand::rng();
    let board = Board::new(height, width, mine_count, &mut rng)?;
    let mut agent = Agent::new(height, width);

    println!("--- Knowledge-Base Minesweeper Bot ---");
    println!("Strategy: Prioritize proven-safe moves, guess randomly otherwise.");
    let total_safe = height * width - board.mine_count();

    // --- 2. Game Loop ---
    let mut move_count = 0;
    let mut lost_on: Option<Cell> = None;
    while agent.moves_made().len() < total_safe {
        move_count += 1;
        println!("\n--- Move #{} ---", move_count);

        // --- 3. Bot's Decision Logic ---
        let cell = match agent.safe_move() {
            Some(cell) => {
                println!("Inference found a proven-safe cell.");
                cell
            }
            None => {
                println!("No proven-safe move available. Making a random guess...");
                agent.random_move(&mut rng)?
            }
        };

        // --- 4. Execute the Chosen Move ---
        println!("Bot reveals ({}, {})...", cell.row, cell.col);
        if board.is_mine(cell) {
            lost_on = Some(cell);
            break;
        }
        agent.record_move(cell, board.adjacent_mines(cell))?;
        print_board(&board, &agent);

        // Add a delay to make the game watchable
        thread::sleep(Duration::from_millis(300));
    }

    // --- 5. Final Result ---
    println!("\n--- Game Over ---");
    match lost_on {
        Some(cell) => println!(
            "Result: the bot revealed a mine at ({}, {}) and lost.",
            cell.row, cell.col
        ),
        None => {
            if board.has_won(agent.known_mines()) {
                println!("Result: the bot won and identified every mine!");
            } else {
                println!("Result: the bot revealed every safe cell.");
            }
        }
    }

    Ok(())
}

fn print_board(board: &Board, agent: &Agent) {
    // Print header
    print!("   ");
    for col in 0..board.width {
        print!("{:^3}", col);
    }
    println!("\n  +{}", "---".repeat(board.width));

    // Print rows: revealed cells show their adjacency count, cells the agent
    // has proven to be mines show a flag, everything else stays hidden
    for row in 0..board.height {
        print!("{:^2}|", row);
        for col in 0..board.width {
            let cell = Cell { row, col };
            let display = if agent.moves_made().contains(&cell) {
                format!(" {} ", board.adjacent_mines(cell))
            } else if agent.known_mines().contains(&cell) {
                " F ".to_string()
            } else {
                " ■ ".to_string()
            };
            print!("{}", display);
        }
        println!();
    }
}
