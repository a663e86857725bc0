//! Static maze grid and grid geometry

use serde::{Deserialize, Serialize};

/// Grid width in cells (x axis)
pub const GRID_WIDTH: usize = 28;
/// Grid height in cells (y axis, y grows upward)
pub const GRID_HEIGHT: usize = 31;

/// Starting (and respawn) cell for the robot
pub const START_POS: (i16, i16) = (14, 7);

/// Cell kinds in the static maze
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    /// Impassable wall
    Wall,
    /// Walkable, holds a regular pellet at game start
    Pellet,
    /// Walkable, empty
    Empty,
    /// Walkable, holds a power pellet at game start
    PowerPellet,
    /// Ghost chamber interior or door, impassable to the robot
    GhostChamber,
    /// Walkable, bonus fruit spawn cell
    Cherry,
}

/// Four-way grid direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dir {
    Up,
    Down,
    Left,
    Right,
}

impl Dir {
    /// Cell offset of one step in this direction
    pub fn offset(self) -> (i16, i16) {
        match self {
            Dir::Up => (0, 1),
            Dir::Down => (0, -1),
            Dir::Left => (-1, 0),
            Dir::Right => (1, 0),
        }
    }

    /// Exact geometric inverse
    pub fn inverse(self) -> Dir {
        match self {
            Dir::Up => Dir::Down,
            Dir::Down => Dir::Up,
            Dir::Left => Dir::Right,
            Dir::Right => Dir::Left,
        }
    }
}

/// Maze layout, one row per line, top row first (y = 30).
///
/// `#` wall, `.` pellet, `o` power pellet, space empty, `n` ghost chamber,
/// `=` chamber door, `c` cherry spawn.
const LAYOUT: [&str; GRID_HEIGHT] = [
    "############################",
    "#............##............#",
    "#.####.#####.##.#####.####.#",
    "#o####.#####.##.#####.####o#",
    "#.####.#####.##.#####.####.#",
    "#..........................#",
    "#.####.##.########.##.####.#",
    "#.####.##.########.##.####.#",
    "#......##....##....##......#",
    "######.##### ## #####.######",
    "######.##### ## #####.######",
    "######.##          ##.######",
    "######.## ###==### ##.######",
    "######.## #nnnnnn# ##.######",
    "      .   #nnnnnn#   .      ",
    "######.## #nnnnnn# ##.######",
    "######.## ######## ##.######",
    "######.##    cc    ##.######",
    "######.## ######## ##.######",
    "######.## ######## ##.######",
    "#............##............#",
    "#.####.#####.##.#####.####.#",
    "#.####.#####.##.#####.####.#",
    "#o..##.......  .......##..o#",
    "###.##.##.########.##.##.###",
    "###.##.##.########.##.##.###",
    "#......##....##....##......#",
    "#.##########.##.##########.#",
    "#.##########.##.##########.#",
    "#..........................#",
    "############################",
];

/// The static maze, indexed as `[x][y]` with y increasing upward
pub struct Map {
    cells: [[Cell; GRID_HEIGHT]; GRID_WIDTH],
}

impl Map {
    /// Parse the built-in layout
    pub fn new() -> Self {
        let mut cells = [[Cell::Wall; GRID_HEIGHT]; GRID_WIDTH];
        for (row, line) in LAYOUT.iter().enumerate() {
            debug_assert_eq!(line.len(), GRID_WIDTH, "layout row {} width", row);
            let y = GRID_HEIGHT - 1 - row;
            for (x, ch) in line.bytes().enumerate() {
                cells[x][y] = match ch {
                    b'#' => Cell::Wall,
                    b'.' => Cell::Pellet,
                    b'o' => Cell::PowerPellet,
                    b' ' => Cell::Empty,
                    b'n' | b'=' => Cell::GhostChamber,
                    b'c' => Cell::Cherry,
                    other => unreachable!("bad layout byte {:?}", other as char),
                };
            }
        }
        Self { cells }
    }

    /// Cell at (x, y); out-of-bounds reads as a wall
    pub fn at(&self, x: i16, y: i16) -> Cell {
        if x < 0 || y < 0 || x as usize >= GRID_WIDTH || y as usize >= GRID_HEIGHT {
            return Cell::Wall;
        }
        self.cells[x as usize][y as usize]
    }

    /// Whether the robot may occupy (x, y)
    pub fn is_passable(&self, x: i16, y: i16) -> bool {
        !matches!(self.at(x, y), Cell::Wall | Cell::GhostChamber)
    }

    /// All cells holding a regular pellet at game start
    pub fn pellet_cells(&self) -> impl Iterator<Item = (i16, i16)> + '_ {
        self.cells_of(Cell::Pellet)
    }

    /// All cells holding a power pellet at game start
    pub fn power_pellet_cells(&self) -> impl Iterator<Item = (i16, i16)> + '_ {
        self.cells_of(Cell::PowerPellet)
    }

    fn cells_of(&self, kind: Cell) -> impl Iterator<Item = (i16, i16)> + '_ {
        (0..GRID_WIDTH).flat_map(move |x| {
            (0..GRID_HEIGHT).filter_map(move |y| {
                (self.cells[x][y] == kind).then_some((x as i16, y as i16))
            })
        })
    }
}

impl Default for Map {
    fn default() -> Self {
        Self::new()
    }
}
