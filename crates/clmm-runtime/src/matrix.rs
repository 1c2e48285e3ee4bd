use thiserror::Error;

/// Width and height of a row-major matrix.
#[derive(new, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MatrixShape {
    /// Number of columns.
    pub width: usize,
    /// Number of rows.
    pub height: usize,
}

impl MatrixShape {
    /// Number of elements, `None` on overflow.
    pub fn num_elems(&self) -> Option<usize> {
        self.width.checked_mul(self.height)
    }

    /// Size in bytes of the `f32` storage, `None` on overflow.
    pub fn size_in_bytes(&self) -> Option<u64> {
        let elems = self.num_elems()?;
        let bytes = elems.checked_mul(core::mem::size_of::<f32>())?;
        u64::try_from(bytes).ok()
    }

    /// Whether one of the dimensions is zero.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl core::fmt::Display for MatrixShape {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}x{}", self.height, self.width)
    }
}

/// Malformed matrices or operand chains.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShapeError {
    /// The data doesn't hold `width * height` elements.
    #[error("Matrix of shape {shape} needs {expected} elements, got {got}")]
    LengthMismatch {
        /// The declared shape.
        shape: MatrixShape,
        /// `width * height`.
        expected: usize,
        /// The data length.
        got: usize,
    },
    /// The element count overflows.
    #[error("Matrix of shape {shape} is too large")]
    Overflow {
        /// The declared shape.
        shape: MatrixShape,
    },
    /// A problem dimension is zero.
    #[error("Matrix dimension '{name}' must be positive")]
    ZeroDimension {
        /// The dimension name.
        name: &'static str,
    },
    /// Operands of the product don't chain.
    #[error("Operand '{name}' has shape {got}, expected {expected}")]
    ChainMismatch {
        /// The operand name.
        name: &'static str,
        /// The expected shape.
        expected: MatrixShape,
        /// The given shape.
        got: MatrixShape,
    },
}

/// A dense row-major matrix of `f32` owned by the host.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    shape: MatrixShape,
    data: Vec<f32>,
}

impl Matrix {
    /// Create a matrix with every element set to `value`.
    pub fn filled(shape: MatrixShape, value: f32) -> Result<Self, ShapeError> {
        let len = shape.num_elems().ok_or(ShapeError::Overflow { shape })?;

        Ok(Self {
            shape,
            data: vec![value; len],
        })
    }

    /// Create a matrix filled with zeros.
    pub fn zeros(shape: MatrixShape) -> Result<Self, ShapeError> {
        Self::filled(shape, 0.0)
    }

    /// Wrap row-major `data`, checking its length against the shape.
    pub fn from_vec(shape: MatrixShape, data: Vec<f32>) -> Result<Self, ShapeError> {
        let expected = shape.num_elems().ok_or(ShapeError::Overflow { shape })?;

        if data.len() != expected {
            return Err(ShapeError::LengthMismatch {
                shape,
                expected,
                got: data.len(),
            });
        }

        Ok(Self { shape, data })
    }

    /// The matrix shape.
    pub fn shape(&self) -> MatrixShape {
        self.shape
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.shape.width
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.shape.height
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the matrix holds no element.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Row-major elements.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Mutable row-major elements.
    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Row-major elements as raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.data)
    }

    /// The elements of row `index`, if it exists.
    pub fn row(&self, index: usize) -> Option<&[f32]> {
        if index >= self.shape.height {
            return None;
        }
        let start = index * self.shape.width;
        self.data.get(start..start + self.shape.width)
    }

    /// The element at `(row, col)`, if it exists.
    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        if row >= self.shape.height || col >= self.shape.width {
            return None;
        }
        self.data.get(row * self.shape.width + col).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_log::test]
    fn from_vec_rejects_wrong_length() {
        let shape = MatrixShape::new(3, 2);
        let err = Matrix::from_vec(shape, vec![0.0; 5]).unwrap_err();

        assert_eq!(
            err,
            ShapeError::LengthMismatch {
                shape,
                expected: 6,
                got: 5
            }
        );
    }

    #[test_log::test]
    fn rows_are_row_major() {
        let matrix =
            Matrix::from_vec(MatrixShape::new(3, 2), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();

        assert_eq!(matrix.row(0), Some(&[1.0, 2.0, 3.0][..]));
        assert_eq!(matrix.row(1), Some(&[4.0, 5.0, 6.0][..]));
        assert_eq!(matrix.row(2), None);
        assert_eq!(matrix.get(1, 0), Some(4.0));
        assert_eq!(matrix.get(0, 3), None);
    }

    #[test_log::test]
    fn byte_size_is_checked() {
        assert_eq!(MatrixShape::new(600, 200).size_in_bytes(), Some(480_000));
        assert_eq!(MatrixShape::new(usize::MAX, 2).size_in_bytes(), None);
        assert!(Matrix::zeros(MatrixShape::new(usize::MAX, 2)).is_err());
    }

    #[test_log::test]
    fn bytes_view_matches_elements() {
        let matrix = Matrix::filled(MatrixShape::new(2, 1), 1.0).unwrap();

        assert_eq!(matrix.as_bytes().len(), 8);
        assert_eq!(&matrix.as_bytes()[0..4], &1.0f32.to_ne_bytes());
    }
}
