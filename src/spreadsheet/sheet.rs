use crate::spreadsheet::cell::Cell;

/// A sheet read from a spreadsheet file: an untyped, sparse grid of cells
/// with no assumed header. Cells are kept in row-major order.
#[derive(Debug)]
pub(crate) struct Sheet {
    /// Sheet name
    pub(crate) name: String,
    /// All non-empty cells in the sheet
    pub(crate) cells: Vec<Cell>,
    /// Index into `cells` of the first cell of every populated row
    rows: Vec<(usize, usize)>,
}

impl Sheet {
    pub(super) fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            cells: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Adds a cell; cells must arrive in row-major order.
    pub(super) fn push(&mut self, cell: Cell) {
        if self.rows.last().map(|(row, _)| *row != cell.row).unwrap_or(true) {
            self.rows.push((cell.row, self.cells.len()));
        }
        self.cells.push(cell);
    }

    /// Restores row-major order for workbooks that store cells out of order.
    pub(super) fn finish(&mut self) {
        let ordered = self.cells
            .windows(2)
            .all(|pair| (pair[0].row, pair[0].col) < (pair[1].row, pair[1].col));
        if !ordered {
            let mut cells = std::mem::take(&mut self.cells);
            cells.sort_by_key(|cell| (cell.row, cell.col));
            self.rows.clear();
            for cell in cells {
                self.push(cell);
            }
        }
    }

    /// Returns the populated cells of one row, ordered by column.
    pub(crate) fn row(&self, row: usize) -> &[Cell] {
        match self.rows.binary_search_by_key(&row, |(row, _)| *row) {
            Ok(position) => {
                let lower = self.rows[position].1;
                let upper = self.rows.get(position + 1).map(|(_, index)| *index).unwrap_or(self.cells.len());
                &self.cells[lower..upper]
            }
            Err(_) => &[],
        }
    }

    /// Iterates over populated rows as (row index, cells) in sheet order.
    /// Rows without any cell are skipped.
    pub(crate) fn rows(&self) -> impl Iterator<Item = (usize, &[Cell])> + '_ {
        self.rows.iter().map(|(row, _)| (*row, self.row(*row)))
    }

    /// Looks up the cell at (row, col), if populated.
    #[cfg(test)]
    pub(crate) fn get(&self, row: usize, col: usize) -> Option<&Cell> {
        let cells = self.row(row);
        cells
            .binary_search_by_key(&col, |cell| cell.col)
            .ok()
            .map(|index| &cells[index])
    }
}

#[cfg(test)]
mod tests {
    use crate::spreadsheet::cell::Cell;
    use crate::spreadsheet::cell::CellType;
    use crate::spreadsheet::sheet::Sheet;

    fn push(sheet: &mut Sheet, row: usize, col: usize, value: &str) {
        sheet.push(Cell {
            row,
            col,
            kind: CellType::Text,
            value: value.to_owned(),
        });
    }

    #[test]
    fn sheet_initial() {
        let sheet = Sheet::new("Raw Data");

        assert!(sheet.cells.is_empty());
        assert_eq!(sheet.rows().count(), 0);
    }

    #[test]
    fn sheet_groups_cells_by_row() {
        let mut sheet = Sheet::new("Raw Data");
        push(&mut sheet, 1, 1, "b2");
        push(&mut sheet, 1, 3, "d2");
        push(&mut sheet, 3, 0, "a4");
        push(&mut sheet, 3, 3, "d4");

        assert_eq!(sheet.cells.len(), 4);

        let rows: Vec<_> = sheet.rows().map(|(row, cells)| (row, cells.len())).collect();
        assert_eq!(rows, vec![(1, 2), (3, 2)]);
        assert!(sheet.row(2).is_empty());
        assert_eq!(sheet.get(3, 3).map(|cell| cell.value.as_str()), Some("d4"));
        assert_eq!(sheet.get(1, 2).map(|cell| cell.value.as_str()), None);
        assert_eq!(sheet.get(7, 0).map(|cell| cell.value.as_str()), None);
    }

    #[test]
    fn sheet_finish_reorders_cells() {
        let mut sheet = Sheet::new("Raw Data");
        push(&mut sheet, 2, 0, "a3");
        push(&mut sheet, 0, 1, "b1");
        push(&mut sheet, 0, 0, "a1");
        sheet.finish();

        let values: Vec<_> = sheet.cells.iter().map(|cell| cell.value.as_str()).collect();
        assert_eq!(values, vec!["a1", "b1", "a3"]);
        assert_eq!(sheet.row(0).len(), 2);
        assert_eq!(sheet.rows().map(|(row, _)| row).collect::<Vec<_>>(), vec![0, 2]);
    }
}
