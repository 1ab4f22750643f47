//! Address-mapping between the accelerator's tiled output and the dense
//! or compact-triangle matrix layouts used on the host side.
//!
//! The accelerator emits the correlation matrix as a sequence of
//! `block_side x block_side` complex tiles covering the upper triangle of
//! the element grid, enumerated row-major: (0,0), (0,1), ..., (0,last),
//! (1,1), ... Diagonal tiles are emitted as full squares even though
//! their below-diagonal entries are not valid results.

/// Tile side length of the accelerator's output blocks.
pub const BLOCK_SIDE: usize = 32;

/// Number of tiles covering the upper triangle of an element grid.
pub fn block_count(num_elements: usize, block_side: usize) -> usize {
    let grid = num_elements / block_side;
    grid * (grid + 1) / 2
}

/// Map a linear block index back to its (block_y, block_x) coordinates in
/// the row-major upper-triangle enumeration of a `grid_width x grid_width`
/// block grid.
pub fn block_id_to_coordinates(block_id: usize, grid_width: usize) -> (usize, usize) {
    let mut row = 0;
    let mut row_start = 0;
    let mut row_len = grid_width;
    while block_id >= row_start + row_len {
        row_start += row_len;
        row_len -= 1;
        row += 1;
    }
    (row, row + (block_id - row_start))
}

/// Expand tiled accelerator output into a full dense matrix per
/// frequency, mirroring the upper triangle into the lower one as complex
/// conjugates. Below-diagonal tile entries (only present inside diagonal
/// tiles) are skipped.
pub fn tile_to_dense(
    block_side: usize,
    num_blocks: usize,
    num_frequencies: usize,
    num_elements: usize,
    tile_data: &[i32],
) -> Vec<i32> {
    let grid_width = num_elements / block_side;
    let tile_len = block_side * block_side * 2;
    let mut dense = vec![0i32; num_frequencies * num_elements * num_elements * 2];

    for frequency_bin in 0..num_frequencies {
        let frequency_base = frequency_bin * num_elements * num_elements;
        for block_id in 0..num_blocks {
            let (block_y, block_x) = block_id_to_coordinates(block_id, grid_width);
            for y_local in 0..block_side {
                let y_global = block_y * block_side + y_local;
                for x_local in 0..block_side {
                    let x_global = block_x * block_side + x_local;
                    if x_global < y_global {
                        continue;
                    }
                    let tile_address = frequency_bin * num_blocks * tile_len
                        + block_id * tile_len
                        + (y_local * block_side + x_local) * 2;
                    if x_global > y_global {
                        // Conjugate mirror into the lower triangle.
                        let mirror = (frequency_base + x_global * num_elements + y_global) * 2;
                        dense[mirror] = tile_data[tile_address];
                        dense[mirror + 1] = -tile_data[tile_address + 1];
                    }
                    let direct = (frequency_base + y_global * num_elements + x_global) * 2;
                    dense[direct] = tile_data[tile_address];
                    dense[direct + 1] = tile_data[tile_address + 1];
                }
            }
        }
    }

    dense
}

/// Reorganize tiled accelerator output into compact upper-triangle form,
/// reading the tile stream strictly sequentially. Diagonal tiles carry
/// below-diagonal entries in the stream; those advance the read pointer
/// without producing output.
pub fn tile_to_triangle(
    block_side: usize,
    num_blocks: usize,
    num_frequencies: usize,
    num_elements: usize,
    tile_data: &[i32],
) -> Vec<i32> {
    let grid_width = num_elements / block_side;
    let triangle_len = num_elements * (num_elements + 1) / 2;
    let mut triangle = vec![0i32; num_frequencies * triangle_len * 2];
    let mut read = 0;

    for frequency_bin in 0..num_frequencies {
        let frequency_offset = frequency_bin * triangle_len;
        for block_id in 0..num_blocks {
            let (block_y, block_x) = block_id_to_coordinates(block_id, grid_width);
            for y_local in 0..block_side {
                for x_local in 0..block_side {
                    let x_global = block_x * block_side + x_local;
                    let y_global = block_y * block_side + y_local;

                    if block_x != block_y || x_local >= y_local {
                        // Entries preceding (y, x) in the triangle: the
                        // full rectangle above row y minus its
                        // lower-triangle part, plus the offset along the
                        // current row.
                        let address = frequency_offset + y_global * num_elements
                            - y_global * y_global.saturating_sub(1) / 2
                            + (x_global - y_global);
                        triangle[address * 2] = tile_data[read];
                        triangle[address * 2 + 1] = tile_data[read + 1];
                    }
                    read += 2;
                }
            }
        }
    }

    triangle
}

/// Compact output produced with elements processed at double the true
/// count: the kernel runs on `2E` virtual elements per band covering two
/// real frequency bands, and only the first and fourth quadrants of each
/// dense `2E x 2E` result hold wanted correlations. Rewrites in place
/// (the output is strictly smaller) and truncates the vector.
pub fn compact_padded_output(
    actual_num_frequencies: usize,
    actual_num_elements: usize,
    correlated_data: &mut Vec<i32>,
) {
    let input_frequencies = actual_num_frequencies / 2;
    let input_elements = actual_num_elements * 2;
    let mut address = 0;
    let mut address_out = 0;

    for _freq in 0..input_frequencies {
        for element_y in 0..input_elements {
            for element_x in 0..input_elements {
                let first_quadrant =
                    element_x < actual_num_elements && element_y < actual_num_elements;
                let fourth_quadrant =
                    element_x >= actual_num_elements && element_y >= actual_num_elements;
                if first_quadrant || fourth_quadrant {
                    correlated_data[address_out] = correlated_data[address];
                    correlated_data[address_out + 1] = correlated_data[address + 1];
                    address_out += 2;
                }
                address += 2;
            }
        }
    }

    correlated_data.truncate(address_out);
}

/// Re-emit a compact triangle into an output frame padded to
/// `final_num_frequencies` bands, zero-filling the bands past
/// `actual_num_frequencies`. The input is dense `E x E` blocks per band
/// (as left by `compact_padded_output`); only the upper triangle of each
/// block is carried over.
pub fn triangle_with_frequency_padding(
    final_num_frequencies: usize,
    actual_num_frequencies: usize,
    num_elements: usize,
    input_data: &[i32],
) -> Vec<i32> {
    let triangle_len = num_elements * (num_elements + 1) / 2;
    let mut out = vec![0i32; final_num_frequencies * triangle_len * 2];
    let mut counter = 0;

    for freq in 0..final_num_frequencies {
        for y in 0..num_elements {
            for x in y..num_elements {
                if freq < actual_num_frequencies {
                    let input_index =
                        (freq * num_elements * num_elements + y * num_elements + x) * 2;
                    out[counter] = input_data[input_index];
                    out[counter + 1] = input_data[input_index + 1];
                }
                counter += 2;
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build a tile stream whose (y_global, x_global) entry encodes its
    /// own coordinates, so misrouted addresses are detectable.
    fn coordinate_tagged_tiles(
        block_side: usize,
        num_blocks: usize,
        num_frequencies: usize,
        num_elements: usize,
    ) -> Vec<i32> {
        let grid_width = num_elements / block_side;
        let tile_len = block_side * block_side * 2;
        let mut data = vec![0i32; num_frequencies * num_blocks * tile_len];
        for f in 0..num_frequencies {
            for block_id in 0..num_blocks {
                let (block_y, block_x) = block_id_to_coordinates(block_id, grid_width);
                for y_local in 0..block_side {
                    for x_local in 0..block_side {
                        let y = block_y * block_side + y_local;
                        let x = block_x * block_side + x_local;
                        let address = f * num_blocks * tile_len
                            + block_id * tile_len
                            + (y_local * block_side + x_local) * 2;
                        data[address] = (f * 10_000 + y * 100 + x) as i32;
                        data[address + 1] = (x as i32) - (y as i32);
                    }
                }
            }
        }
        data
    }

    #[test]
    fn block_coordinates_match_direct_enumeration() {
        for grid_width in 1..=8 {
            let mut expected = Vec::new();
            for j in 0..grid_width {
                for i in j..grid_width {
                    expected.push((j, i));
                }
            }
            for (block_id, want) in expected.iter().enumerate() {
                assert_eq!(
                    block_id_to_coordinates(block_id, grid_width),
                    *want,
                    "grid {} block {}",
                    grid_width,
                    block_id
                );
            }
            assert_eq!(expected.len(), block_count(grid_width * 4, 4));
        }
    }

    #[test]
    fn tile_to_dense_routes_and_mirrors() {
        let block_side = 4;
        let num_elements = 8;
        let num_frequencies = 2;
        let num_blocks = block_count(num_elements, block_side);
        let tiles = coordinate_tagged_tiles(block_side, num_blocks, num_frequencies, num_elements);
        let dense = tile_to_dense(block_side, num_blocks, num_frequencies, num_elements, &tiles);

        for f in 0..num_frequencies {
            for y in 0..num_elements {
                for x in 0..num_elements {
                    let address = (f * num_elements * num_elements + y * num_elements + x) * 2;
                    if x >= y {
                        assert_eq!(dense[address], (f * 10_000 + y * 100 + x) as i32);
                        assert_eq!(dense[address + 1], x as i32 - y as i32);
                    } else {
                        // Mirrored conjugate of the (x, y) entry.
                        assert_eq!(dense[address], (f * 10_000 + x * 100 + y) as i32);
                        assert_eq!(dense[address + 1], -(y as i32 - x as i32));
                    }
                }
            }
        }
    }

    #[test]
    fn tile_to_triangle_equals_dense_restricted_to_triangle() {
        for (block_side, num_elements) in [(4usize, 8usize), (4, 12), (8, 16), (2, 2)] {
            let num_frequencies = 2;
            let num_blocks = block_count(num_elements, block_side);
            let tiles =
                coordinate_tagged_tiles(block_side, num_blocks, num_frequencies, num_elements);
            let dense =
                tile_to_dense(block_side, num_blocks, num_frequencies, num_elements, &tiles);
            let triangle =
                tile_to_triangle(block_side, num_blocks, num_frequencies, num_elements, &tiles);

            let mut counter = 0;
            for f in 0..num_frequencies {
                for y in 0..num_elements {
                    for x in y..num_elements {
                        let address = (f * num_elements * num_elements + y * num_elements + x) * 2;
                        assert_eq!(triangle[counter], dense[address]);
                        assert_eq!(triangle[counter + 1], dense[address + 1]);
                        counter += 2;
                    }
                }
            }
            assert_eq!(counter, triangle.len());
        }
    }

    #[test]
    fn padded_compaction_keeps_first_and_fourth_quadrants() {
        let actual_elements = 2;
        let actual_frequencies = 2;
        let input_elements = actual_elements * 2;
        // One padded band of 4x4 entries, values tagged y*10 + x.
        let mut data = Vec::new();
        for y in 0..input_elements {
            for x in 0..input_elements {
                data.push((y * 10 + x) as i32);
                data.push(-((y * 10 + x) as i32));
            }
        }
        compact_padded_output(actual_frequencies, actual_elements, &mut data);

        // First quadrant (y<2, x<2) then fourth quadrant (y>=2, x>=2).
        let expected_re = [0, 1, 10, 11, 22, 23, 32, 33];
        assert_eq!(data.len(), expected_re.len() * 2);
        for (i, want) in expected_re.iter().enumerate() {
            assert_eq!(data[i * 2], *want);
            assert_eq!(data[i * 2 + 1], -*want);
        }
    }

    #[test]
    fn frequency_padding_zero_fills_missing_bands() {
        let num_elements = 4;
        let actual_frequencies = 1;
        let final_frequencies = 3;
        let mut input = Vec::new();
        for y in 0..num_elements {
            for x in 0..num_elements {
                input.push((y * num_elements + x) as i32);
                input.push(1);
            }
        }
        let out = triangle_with_frequency_padding(
            final_frequencies,
            actual_frequencies,
            num_elements,
            &input,
        );

        let triangle_len = num_elements * (num_elements + 1) / 2;
        assert_eq!(out.len(), final_frequencies * triangle_len * 2);

        let mut counter = 0;
        for y in 0..num_elements {
            for x in y..num_elements {
                assert_eq!(out[counter], (y * num_elements + x) as i32);
                assert_eq!(out[counter + 1], 1);
                counter += 2;
            }
        }
        // Bands past the actual count are zero.
        assert!(out[counter..].iter().all(|&v| v == 0));
    }
}
