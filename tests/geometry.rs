//! Coverage properties of image tiling over many source and grid sizes

use glyphmosaic::geometry::{segments, tile};
use glyphmosaic::{CellBounds, Granularity};

fn coverage_counts(cells: &[CellBounds], width: u32, height: u32) -> Vec<u32> {
    let mut counts = vec![0; (width * height) as usize];
    for cell in cells {
        for y in cell.y_min..cell.y_max {
            for x in cell.x_min..cell.x_max {
                counts[(y * width + x) as usize] += 1;
            }
        }
    }
    counts
}

#[test]
fn tiles_partition_the_source() {
    for sw in 1..=24 {
        for sh in [1, 7, 16, 23] {
            for gw in 1..=sw {
                for gh in 1..=sh.min(5) {
                    let cells = tile(sw, sh, gw, gh);
                    assert_eq!(cells.len(), (gw * gh) as usize);
                    assert!(
                        coverage_counts(&cells, sw, sh).iter().all(|&c| c == 1),
                        "{sw}x{sh} into {gw}x{gh}"
                    );

                    let widths: Vec<u32> = cells.iter().map(CellBounds::width).collect();
                    let spread = widths.iter().max().unwrap() - widths.iter().min().unwrap();
                    assert!(spread <= 1, "{sw}x{sh} into {gw}x{gh}: widths {widths:?}");
                }
            }
        }
    }
}

#[test]
fn cells_of_even_division_are_equal() {
    let cells = tile(120, 60, 12, 6);
    assert!(cells.iter().all(|c| c.width() == 10 && c.height() == 10));
}

#[test]
fn segments_partition_each_cell() {
    for cell in tile(37, 29, 5, 3) {
        for g in Granularity::PRESETS {
            let segs = segments(cell, g);
            assert_eq!(segs.len(), g.segment_count());
            let local: Vec<CellBounds> = segs
                .iter()
                .map(|s| {
                    CellBounds::new(
                        s.x_min - cell.x_min,
                        s.x_max - cell.x_min,
                        s.y_min - cell.y_min,
                        s.y_max - cell.y_min,
                    )
                })
                .collect();
            assert!(coverage_counts(&local, cell.width(), cell.height()).iter().all(|&c| c == 1));
        }
    }
}
