//! Rectangular table of intensities of one incident-angle query.

use crate::source::{SampleSet, SampleSource, SourceError};

/// Intensities of every channel at every sample point of one query.
///
/// Rows are channels (`0` is luminance), columns sample points. Rows that the
/// source did not hand out in bulk stay empty until they are materialised
/// with [`RawMeasurement::fetch_row`]. The table is replaced as a whole on
/// every new query.
#[derive(Debug, Clone)]
pub struct RawMeasurement {
    n_points: usize,
    rows: Box<[Option<Box<[f32]>>]>,
}

impl RawMeasurement {
    /// Takes the rows out of a sample set after checking their shape.
    pub fn from_sample_set(samples: &mut SampleSet, n_channels: usize) -> Result<Self, SourceError> {
        let n_points = samples.len();
        if samples.colors.len() != n_points {
            return Err(SourceError::Malformed(format!(
                "{} colours for {} points",
                samples.colors.len(),
                n_points
            )));
        }
        let mut rows = std::mem::take(&mut samples.rows);
        if rows.len() > n_channels {
            return Err(SourceError::Malformed(format!(
                "{} rows for {} channels",
                rows.len(),
                n_channels
            )));
        }
        rows.resize(n_channels, None);
        match rows.first() {
            Some(Some(_)) => {},
            _ => return Err(SourceError::Malformed("missing luminance row".into())),
        }
        if let Some(c) = rows
            .iter()
            .position(|row| row.as_ref().is_some_and(|r| r.len() != n_points))
        {
            return Err(SourceError::Malformed(format!(
                "row {} does not have {} values",
                c, n_points
            )));
        }
        Ok(Self {
            n_points,
            rows: rows.into_boxed_slice(),
        })
    }

    /// Number of sample points.
    pub fn n_points(&self) -> usize { self.n_points }

    /// Number of channels, luminance included.
    pub fn n_channels(&self) -> usize { self.rows.len() }

    /// Whether the row of `channel` is already materialised.
    pub fn is_fetched(&self, channel: usize) -> bool {
        self.rows.get(channel).is_some_and(Option::is_some)
    }

    /// Row of `channel` if it is materialised.
    pub fn row(&self, channel: usize) -> Option<&[f32]> {
        self.rows.get(channel).and_then(|row| row.as_deref())
    }

    /// Returns the row of `channel`, asking the source for it on first use.
    pub fn fetch_row(
        &mut self,
        channel: usize,
        source: &dyn SampleSource,
    ) -> Result<&[f32], SourceError> {
        let count = self.rows.len();
        let n_points = self.n_points;
        match self.rows.get_mut(channel) {
            None => Err(SourceError::ChannelOutOfRange { channel, count }),
            Some(Some(row)) => Ok(&row[..]),
            Some(slot) => {
                log::debug!("[RawMeasurement] Materialising row of channel {}", channel);
                let mut row = vec![0.0; n_points].into_boxed_slice();
                source.sample_channel(channel, &mut row)?;
                Ok(&slot.insert(row)[..])
            },
        }
    }

    /// Intensity of `point` on `channel`, read from the table when the row is
    /// materialised, otherwise asked to the source without caching.
    pub fn intensity(
        &self,
        channel: usize,
        point: usize,
        source: &dyn SampleSource,
    ) -> Result<f32, SourceError> {
        match self.row(channel) {
            Some(row) => row.get(point).copied().ok_or(SourceError::PointOutOfRange {
                point,
                count: self.n_points,
            }),
            None if channel < self.rows.len() => source.sample_channel_at_point(channel, point),
            None => Err(SourceError::ChannelOutOfRange {
                channel,
                count: self.rows.len(),
            }),
        }
    }
}
