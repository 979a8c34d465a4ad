use anyhow::{bail, ensure};
use itertools::Itertools;
use rand::Rng;
use rand::prelude::IndexedRandom;
use std::collections::HashSet;

/// Represents a 2D coordinate on the minesweeper board, 0-indexed from the
/// top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}

/// The minesweeper field: fixed dimensions plus the hidden mine locations.
/// Immutable once constructed. The agent never reads `mines` directly; it only
/// ever sees adjacency counts handed to it by the driver.
pub struct Board {
    pub height: usize,
    pub width: usize,
    mines: HashSet<Cell>,
}

/// A logical statement about the board: exactly `count` of `cells` are mines.
///
/// A sentence only ever talks about cells whose status is still unknown. When
/// a cell's status is established, the sentence is rewritten to exclude it
/// (see `mark_mine` / `mark_safe`), so the two degenerate forms carry complete
/// information: `count == cells.len()` means every member is a mine, and
/// `count == 0` means every member is safe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentence {
    cells: HashSet<Cell>,
    count: usize,
}

/// The knowledge-base player. It accumulates sentences from revealed cells,
/// runs inference to a fixpoint after each reveal, and tracks which cells are
/// proven safe or proven mines.
///
/// All three conclusion sets (`moves_made`, `safes`, `mines`) grow
/// monotonically; a cell never changes status once established.
pub struct Agent {
    pub height: usize,
    pub width: usize,
    moves_made: HashSet<Cell>,
    safes: HashSet<Cell>,
    mines: HashSet<Cell>,
    knowledge: Vec<Sentence>,
}

/// All valid neighbor coordinates of a cell: the up-to-8 surrounding cells
/// that fall within the board bounds, excluding the cell itself.
fn neighbors(height: usize, width: usize, cell: Cell) -> impl Iterator<Item = Cell> {
    (-1..=1).flat_map(move |dr: isize| {
        (-1..=1).filter_map(move |dc: isize| {
            if dr == 0 && dc == 0 {
                return None;
            }

            let row = cell.row as isize + dr;
            let col = cell.col as isize + dc;

            if row >= 0 && row < height as isize && col >= 0 && col < width as isize {
                Some(Cell {
                    row: row as usize,
                    col: col as usize,
                })
            } else {
                None
            }
        })
    })
}

// --- Board Implementation ---

impl Board {
    /// Creates a board with `mine_count` distinct mines placed uniformly at
    /// random. Fails if the dimensions are zero or the mines outnumber the
    /// cells.
    pub fn new(
        height: usize,
        width: usize,
        mine_count: usize,
        rng: &mut impl Rng,
    ) -> anyhow::Result<Self> {
        ensure!(height > 0 && width > 0, "board dimensions must be positive");

        let all_cells: Vec<Cell> = (0..height)
            .cartesian_product(0..width)
            .map(|(row, col)| Cell { row, col })
            .collect();
        ensure!(
            mine_count <= all_cells.len(),
            "{} mines cannot fit on a board of {} cells",
            mine_count,
            all_cells.len()
        );

        let mines = all_cells.choose_multiple(rng, mine_count).copied().collect();

        Ok(Board {
            height,
            width,
            mines,
        })
    }

    /// Creates a board with an explicit mine layout. Fails if the dimensions
    /// are zero or any mine lies out of bounds.
    pub fn with_mines(height: usize, width: usize, mines: HashSet<Cell>) -> anyhow::Result<Self> {
        ensure!(height > 0 && width > 0, "board dimensions must be positive");
        for cell in &mines {
            ensure!(
                cell.row < height && cell.col < width,
                "mine at ({}, {}) is out of bounds",
                cell.row,
                cell.col
            );
        }

        Ok(Board {
            height,
            width,
            mines,
        })
    }

    pub fn is_mine(&self, cell: Cell) -> bool {
        self.mines.contains(&cell)
    }

    pub fn mine_count(&self) -> usize {
        self.mines.len()
    }

    /// The number of mines within one row and column of `cell`, not counting
    /// `cell` itself.
    pub fn adjacent_mines(&self, cell: Cell) -> usize {
        self.neighbors(cell).filter(|c| self.mines.contains(c)).count()
    }

    /// True iff `found` identifies every mine exactly (set equality).
    pub fn has_won(&self, found: &HashSet<Cell>) -> bool {
        *found == self.mines
    }

    /// All in-bounds neighbors of `cell`. Correctly handles edges and corners.
    pub fn neighbors(&self, cell: Cell) -> impl Iterator<Item = Cell> {
        neighbors(self.height, self.width, cell)
    }
}

// --- Sentence Implementation ---

impl Sentence {
    pub fn new(cells: HashSet<Cell>, count: usize) -> Self {
        Sentence { cells, count }
    }

    pub fn cells(&self) -> &HashSet<Cell> {
        &self.cells
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// The cells this sentence proves to be mines: all of them, if the count
    /// covers the whole set, otherwise none.
    pub fn known_mines(&self) -> HashSet<Cell> {
        if self.count == self.cells.len() {
            self.cells.clone()
        } else {
            HashSet::new()
        }
    }

    /// The cells this sentence proves to be safe: all of them, if the count is
    /// zero, otherwise none.
    pub fn known_safes(&self) -> HashSet<Cell> {
        if self.count == 0 {
            self.cells.clone()
        } else {
            HashSet::new()
        }
    }

    /// Rewrites the sentence given that `cell` is a mine: the cell leaves the
    /// set and takes one unit of the count with it. No-op if the cell is not a
    /// member.
    pub fn mark_mine(&mut self, cell: Cell) {
        if self.cells.remove(&cell) {
            self.count -= 1;
        }
    }

    /// Rewrites the sentence given that `cell` is safe: the cell leaves the
    /// set, the count is unaffected. No-op if the cell is not a member.
    pub fn mark_safe(&mut self, cell: Cell) {
        self.cells.remove(&cell);
    }

    /// An empty sentence is trivially satisfied and carries no information.
    fn is_trivial(&self) -> bool {
        self.cells.is_empty()
    }
}

// --- Agent Implementation ---

impl Agent {
    pub fn new(height: usize, width: usize) -> Self {
        Agent {
            height,
            width,
            moves_made: HashSet::new(),
            safes: HashSet::new(),
            mines: HashSet::new(),
            knowledge: Vec::new(),
        }
    }

    pub fn known_mines(&self) -> &HashSet<Cell> {
        &self.mines
    }

    pub fn known_safes(&self) -> &HashSet<Cell> {
        &self.safes
    }

    pub fn moves_made(&self) -> &HashSet<Cell> {
        &self.moves_made
    }

    /// Concludes that `cell` is a mine and rewrites every sentence to reflect
    /// that.
    pub fn mark_mine(&mut self, cell: Cell) {
        self.mines.insert(cell);
        for sentence in &mut self.knowledge {
            sentence.mark_mine(cell);
        }
    }

    /// Concludes that `cell` is safe and rewrites every sentence to reflect
    /// that.
    pub fn mark_safe(&mut self, cell: Cell) {
        self.safes.insert(cell);
        for sentence in &mut self.knowledge {
            sentence.mark_safe(cell);
        }
    }

    /// The primary entry point, called once per board reveal with the cell
    /// that was played and its adjacency count as reported by the board.
    ///
    /// The reveal is recorded, the count is re-expressed over the neighbors
    /// whose status is still unknown (neighbors already proven to be mines
    /// each explain away one unit of the count; proven-safe neighbors
    /// contribute nothing), and the resulting sentence joins the knowledge
    /// base unless it is empty or already present. Inference then runs to a
    /// fixpoint.
    ///
    /// Revealing a cell twice is a caller error, as is a count inconsistent
    /// with established knowledge.
    pub fn record_move(&mut self, cell: Cell, count: usize) -> anyhow::Result<()> {
        ensure!(
            !self.moves_made.contains(&cell),
            "cell ({}, {}) has already been played",
            cell.row,
            cell.col
        );
        self.moves_made.insert(cell);
        self.mark_safe(cell);

        // Partition the neighbors by what is already known.
        let mut cells = HashSet::new();
        let mut count = count;
        for neighbor in neighbors(self.height, self.width, cell) {
            if self.mines.contains(&neighbor) {
                ensure!(
                    count > 0,
                    "adjacency count for ({}, {}) contradicts known mines",
                    cell.row,
                    cell.col
                );
                count -= 1;
            } else if !self.safes.contains(&neighbor) {
                cells.insert(neighbor);
            }
        }
        ensure!(
            count <= cells.len(),
            "adjacency count for ({}, {}) exceeds its {} undetermined neighbors",
            cell.row,
            cell.col,
            cells.len()
        );

        if !cells.is_empty() {
            let sentence = Sentence::new(cells, count);
            if !self.knowledge.contains(&sentence) {
                self.knowledge.push(sentence);
            }
        }

        self.propagate();
        Ok(())
    }

    /// Runs direct resolution and subset inference repeatedly until a full
    /// pass establishes no new safe cell, no new mine, and no new sentence.
    ///
    /// Termination is guaranteed: conclusions only accumulate and the cells a
    /// sentence can mention shrink as conclusions land, so the knowledge base
    /// stabilizes on any finite board.
    fn propagate(&mut self) {
        loop {
            let mut changed = false;

            // Direct resolution. Conclusions are collected first and applied
            // after, so the knowledge base is never mutated mid-iteration.
            let mut sure_mines = HashSet::new();
            let mut sure_safes = HashSet::new();
            for sentence in &self.knowledge {
                sure_mines.extend(sentence.known_mines());
                sure_safes.extend(sentence.known_safes());
            }
            for cell in sure_mines {
                if !self.mines.contains(&cell) {
                    self.mark_mine(cell);
                    changed = true;
                }
            }
            for cell in sure_safes {
                if !self.safes.contains(&cell) {
                    self.mark_safe(cell);
                    changed = true;
                }
            }

            // Subset inference: when one sentence's cells form a proper
            // subset of another's, the superset can shed the shared cells
            // along with their share of the count.
            let mut derived: Vec<Sentence> = Vec::new();
            for (i, sub) in self.knowledge.iter().enumerate() {
                for (j, sup) in self.knowledge.iter().enumerate() {
                    if i == j
                        || sub.is_trivial()
                        || sub.cells.len() >= sup.cells.len()
                        || !sub.cells.is_subset(&sup.cells)
                    {
                        continue;
                    }
                    let cells: HashSet<Cell> =
                        sup.cells.difference(&sub.cells).copied().collect();
                    let sentence = Sentence::new(cells, sup.count - sub.count);
                    if !self.knowledge.contains(&sentence) && !derived.contains(&sentence) {
                        derived.push(sentence);
                    }
                }
            }
            if !derived.is_empty() {
                changed = true;
                self.knowledge.append(&mut derived);
            }

            // Trivially satisfied sentences carry no information.
            self.knowledge.retain(|sentence| !sentence.is_trivial());

            if !changed {
                break;
            }
        }
    }

    /// A cell proven safe that has not been played yet, if any. Read-only:
    /// `moves_made` is the authoritative record of what has been played, so
    /// repeated calls without an intervening `record_move` return the same
    /// cell.
    pub fn safe_move(&self) -> Option<Cell> {
        self.safes.difference(&self.moves_made).min().copied()
    }

    /// A uniformly random cell that has not been played and is not a known
    /// mine, drawn from the whole board. Fails if no such cell exists; the
    /// caller is expected to detect that terminal state (board solved, or
    /// nothing left but mines) before asking.
    pub fn random_move(&self, rng: &mut impl Rng) -> anyhow::Result<Cell> {
        let candidates: Vec<Cell> = (0..self.height)
            .cartesian_product(0..self.width)
            .map(|(row, col)| Cell { row, col })
            .filter(|cell| !self.moves_made.contains(cell) && !self.mines.contains(cell))
            .collect();

        match candidates.choose(rng) {
            Some(cell) => Ok(*cell),
            None => bail!("no playable cells remain"),
        }
    }
}
