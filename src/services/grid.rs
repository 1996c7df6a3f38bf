//! Discretized table occupancy for the correlation service

use glam::Vec2;

use crate::config::GridConfig;
use crate::sim::Ball;

/// Grid cell (row, column) containing `pos`, if it falls on the grid
pub fn cell_for(pos: Vec2, grid: &GridConfig) -> Option<(usize, usize)> {
    let cell_w = grid.width / grid.cols as f32;
    let cell_h = grid.height / grid.rows as f32;

    let row = (pos.y / cell_h).floor();
    let col = (pos.x / cell_w).floor();
    if row < 0.0 || col < 0.0 {
        return None;
    }

    let (row, col) = (row as usize, col as usize);
    if row >= grid.rows || col >= grid.cols {
        return None;
    }
    Some((row, col))
}

/// Mark every visible ball's cell with the occupied sentinel
pub fn occupancy_grid(balls: &[Ball], grid: &GridConfig) -> Vec<Vec<u8>> {
    let mut cells = vec![vec![0u8; grid.cols]; grid.rows];

    for ball in balls.iter().filter(|b| b.visible) {
        match cell_for(ball.pos, grid) {
            Some((row, col)) => cells[row][col] = grid.occupied,
            None => log::debug!("ball {} at {:?} is off the grid", ball.id, ball.pos),
        }
    }
    cells
}
