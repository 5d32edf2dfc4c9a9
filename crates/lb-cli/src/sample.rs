//! Parsing for position samples fed to `lb track` and coordinates given on
//! the command line.

use lb_core::Coordinate;

/// One line of `lb track` input: `lat,lng` or `lat,lng,unix_ms`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SampleLine {
    pub coordinate: Coordinate,
    pub timestamp: Option<i64>,
}

/// Parse a sample line. Blank lines and `#` comments yield `Ok(None)`.
pub fn parse_sample_line(line: &str) -> Result<Option<SampleLine>, String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let fields: Vec<&str> = line.split(',').map(str::trim).collect();
    let (coordinate, timestamp) = match fields.as_slice() {
        [lat, lng] => (parse_pair(lat, lng)?, None),
        [lat, lng, ts] => {
            let ts = ts
                .parse::<i64>()
                .map_err(|_| format!("invalid timestamp '{ts}'"))?;
            (parse_pair(lat, lng)?, Some(ts))
        }
        _ => return Err(format!("expected 'lat,lng[,unix_ms]', got '{line}'")),
    };
    Ok(Some(SampleLine {
        coordinate,
        timestamp,
    }))
}

/// Parse `lat,lng` as given to `lb place add`.
pub fn parse_coordinate(s: &str) -> Result<Coordinate, String> {
    match s.split(',').map(str::trim).collect::<Vec<_>>().as_slice() {
        [lat, lng] => parse_pair(lat, lng),
        _ => Err(format!("expected 'lat,lng', got '{s}'")),
    }
}

fn parse_pair(lat: &str, lng: &str) -> Result<Coordinate, String> {
    let latitude = lat
        .parse::<f64>()
        .map_err(|_| format!("invalid latitude '{lat}'"))?;
    let longitude = lng
        .parse::<f64>()
        .map_err(|_| format!("invalid longitude '{lng}'"))?;
    Ok(Coordinate::new(latitude, longitude))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_without_timestamp() {
        let s = parse_sample_line("37.0, -122.0").unwrap().unwrap();
        assert_eq!(s.coordinate, Coordinate::new(37.0, -122.0));
        assert_eq!(s.timestamp, None);
    }

    #[test]
    fn test_with_timestamp() {
        let s = parse_sample_line("37.0,-122.0,1700000000000").unwrap().unwrap();
        assert_eq!(s.timestamp, Some(1_700_000_000_000));
    }

    #[test]
    fn test_blank_and_comment_skipped() {
        assert_eq!(parse_sample_line("   ").unwrap(), None);
        assert_eq!(parse_sample_line("# morning walk").unwrap(), None);
    }

    #[test]
    fn test_malformed_lines() {
        assert!(parse_sample_line("37.0").is_err());
        assert!(parse_sample_line("north,-122.0").is_err());
        assert!(parse_sample_line("37.0,-122.0,soon").is_err());
        assert!(parse_sample_line("1,2,3,4").is_err());
    }

    #[test]
    fn test_out_of_range_parses() {
        // Range checks belong to the tracker
        let s = parse_sample_line("95.0,0.0").unwrap().unwrap();
        assert!(!s.coordinate.is_valid());
    }

    #[test]
    fn test_parse_coordinate() {
        assert_eq!(
            parse_coordinate("-33.86,151.21").unwrap(),
            Coordinate::new(-33.86, 151.21)
        );
        assert!(parse_coordinate("1,2,3").is_err());
    }
}
