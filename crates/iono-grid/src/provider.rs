//! Model-output provider abstraction.
//!
//! The engine never opens files itself. A provider hands it 4-D fields
//! shaped `[time][level][lat][lon]` and the coordinate axes that go with them.

use std::collections::HashMap;

use ndarray::{Array4, ArrayView4};

use crate::error::{GridError, Result};
use crate::types::{Axis, AxisKind, FieldId};

/// Source of model fields and coordinate axes.
pub trait ModelDataProvider: Send + Sync {
    /// Read a full `[time][level][lat][lon]` field.
    fn read_field(&self, id: FieldId) -> Result<Array4<f64>>;

    /// Read a coordinate axis.
    fn read_axis(&self, kind: AxisKind) -> Result<Axis>;

    /// Fields this provider can supply.
    fn available_fields(&self) -> Vec<FieldId>;
}

/// Provider backed by arrays already in memory.
///
/// The field map is filled once when the provider is built; every field is
/// checked against the axis lengths on insertion.
#[derive(Debug, Clone)]
pub struct InMemoryProvider {
    time: Axis,
    level: Axis,
    lat: Axis,
    lon: Axis,
    fields: HashMap<FieldId, Array4<f64>>,
}

impl InMemoryProvider {
    /// Create an empty provider for the given axes.
    pub fn new(time: Axis, level: Axis, lat: Axis, lon: Axis) -> Self {
        Self {
            time,
            level,
            lat,
            lon,
            fields: HashMap::new(),
        }
    }

    /// Expected `[time][level][lat][lon]` shape.
    pub fn shape(&self) -> [usize; 4] {
        [
            self.time.len(),
            self.level.len(),
            self.lat.len(),
            self.lon.len(),
        ]
    }

    /// Register a field, replacing any previous array for the same id.
    pub fn insert_field(&mut self, id: FieldId, data: Array4<f64>) -> Result<()> {
        let expected = self.shape();
        if data.shape() != &expected[..] {
            return Err(GridError::shape_mismatch(&expected, data.shape()));
        }
        self.fields.insert(id, data);
        Ok(())
    }

    /// Builder form of [`insert_field`](Self::insert_field).
    pub fn with_field(mut self, id: FieldId, data: Array4<f64>) -> Result<Self> {
        self.insert_field(id, data)?;
        Ok(self)
    }

    /// Borrow a field without copying it.
    pub fn field_view(&self, id: FieldId) -> Result<ArrayView4<'_, f64>> {
        self.fields
            .get(&id)
            .map(|a| a.view())
            .ok_or_else(|| GridError::MissingField(id.to_string()))
    }

    pub fn axis(&self, kind: AxisKind) -> &Axis {
        match kind {
            AxisKind::Time => &self.time,
            AxisKind::Level => &self.level,
            AxisKind::Lat => &self.lat,
            AxisKind::Lon => &self.lon,
        }
    }
}

impl ModelDataProvider for InMemoryProvider {
    fn read_field(&self, id: FieldId) -> Result<Array4<f64>> {
        self.field_view(id).map(|v| v.to_owned())
    }

    fn read_axis(&self, kind: AxisKind) -> Result<Axis> {
        Ok(self.axis(kind).clone())
    }

    fn available_fields(&self) -> Vec<FieldId> {
        let mut ids: Vec<FieldId> = self.fields.keys().copied().collect();
        ids.sort();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> InMemoryProvider {
        InMemoryProvider::new(
            Axis::uniform(AxisKind::Time, 0.0, 60.0, 2).unwrap(),
            Axis::uniform(AxisKind::Level, 0.0, 1.0, 3).unwrap(),
            Axis::uniform(AxisKind::Lat, -2.5, 2.5, 3).unwrap(),
            Axis::uniform(AxisKind::Lon, 0.0, 5.0, 4).unwrap(),
        )
    }

    #[test]
    fn test_insert_and_read() {
        let p = provider()
            .with_field(FieldId::NeutralTemperature, Array4::from_elem((2, 3, 3, 4), 800.0))
            .unwrap();
        let tn = p.read_field(FieldId::NeutralTemperature).unwrap();
        assert_eq!(tn.shape(), &[2, 3, 3, 4]);
        assert_eq!(p.available_fields(), vec![FieldId::NeutralTemperature]);
        assert_eq!(p.read_axis(AxisKind::Lon).unwrap().len(), 4);
    }

    #[test]
    fn test_shape_checked_on_insert() {
        let err = provider()
            .with_field(FieldId::JouleHeating, Array4::zeros((2, 3, 3, 5)))
            .unwrap_err();
        assert!(matches!(err, GridError::ShapeMismatch { .. }));
    }

    #[test]
    fn test_missing_field() {
        let err = provider().read_field(FieldId::ElectronDensity).unwrap_err();
        assert_eq!(err, GridError::MissingField("ne".to_string()));
    }
}
