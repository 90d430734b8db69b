// src/forms/location.rs

use std::fmt;
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Serialize, Serializer};

use super::errors::FormError;

pub const COORDINATE_DECIMAL_PLACES: u32 = 6;

/// Coordenada GPS já normalizada: sempre 6 casas decimais.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Coordinate(Decimal);

impl Coordinate {
    pub fn as_decimal(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl Serialize for Coordinate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Arredonda para 6 casas com "half up" (empate se afasta do zero).
pub fn normalize_coordinate(raw: &str) -> Result<Coordinate, FormError> {
    let raw = raw.trim();
    let value = Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .map_err(|_| FormError::InvalidCoordinate)?;

    let mut rounded = value.round_dp_with_strategy(
        COORDINATE_DECIMAL_PLACES,
        RoundingStrategy::MidpointAwayFromZero,
    );
    // round_dp não completa zeros à direita; rescale sim
    rounded.rescale(COORDINATE_DECIMAL_PLACES);

    Ok(Coordinate(rounded))
}

/// Regra da etapa 1: as duas coordenadas são obrigatórias.
/// Coordenada zero conta como ausente (GPS que não respondeu).
/// Ausência de qualquer uma vence o erro de formato.
pub fn clean_location(
    latitude: Option<&str>,
    longitude: Option<&str>,
) -> Result<(Coordinate, Coordinate), FormError> {
    let (Some(lat), Some(lon)) = (latitude, longitude) else {
        return Err(FormError::MissingLocation);
    };

    let lat = normalize_coordinate(lat);
    let lon = normalize_coordinate(lon);
    let is_zero = |c: &Result<Coordinate, FormError>| matches!(c, Ok(c) if c.as_decimal().is_zero());
    if is_zero(&lat) || is_zero(&lon) {
        return Err(FormError::MissingLocation);
    }

    Ok((lat?, lon?))
}
