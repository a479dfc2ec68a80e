//! # CRC-8 Engine
//!
//! Table-driven CRC-8 with a configurable polynomial. CRSF uses CRC-8-DVB-S2.
//!
//! **Polynomial**: 0xD5 (x^8 + x^7 + x^6 + x^4 + x^2 + 1)
//! **Initial Value**: 0x00

/// CRC-8-DVB-S2 polynomial
pub const CRC8_POLY_DVB_S2: u8 = 0xD5;

/// Engine used for every CRSF frame. The table is built at compile time and
/// shared read-only by all decoders.
pub static CRC8_DVB_S2: Crc8 = Crc8::new(CRC8_POLY_DVB_S2);

/// Table-driven CRC-8 calculator
///
/// The lookup table is derived once from the polynomial and never changes
/// afterwards, so a single engine can be shared between decoders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Crc8 {
    polynomial: u8,
    table: [u8; 256],
}

impl Crc8 {
    /// Build the 256-entry lookup table for `polynomial`
    ///
    /// Each entry is the remainder of its index after eight rounds of
    /// "shift left, XOR with the polynomial if the shifted-out bit was set".
    ///
    /// # Examples
    ///
    /// ```
    /// use crsf_link::crsf::crc::Crc8;
    ///
    /// let crc = Crc8::new(0xD5);
    /// assert_eq!(crc.calculate(b"123456789"), 0xBC);
    /// ```
    pub const fn new(polynomial: u8) -> Self {
        let mut table = [0u8; 256];
        let mut i = 0;

        while i < 256 {
            let mut crc = i as u8;
            let mut j = 0;

            while j < 8 {
                if (crc & 0x80) != 0 {
                    crc = (crc << 1) ^ polynomial;
                } else {
                    crc <<= 1;
                }
                j += 1;
            }

            table[i] = crc;
            i += 1;
        }

        Self { polynomial, table }
    }

    /// Calculate the CRC of `data`
    ///
    /// # Arguments
    ///
    /// * `data` - Bytes covered by the checksum (for CRSF: type + payload)
    ///
    /// # Returns
    ///
    /// * `u8` - Checksum, `0` for empty input
    pub fn calculate(&self, data: &[u8]) -> u8 {
        data.iter()
            .fold(0u8, |crc, &byte| self.table[(crc ^ byte) as usize])
    }

    /// Polynomial this engine was built from
    pub fn polynomial(&self) -> u8 {
        self.polynomial
    }

    /// Read-only view of the lookup table
    pub fn table(&self) -> &[u8; 256] {
        &self.table
    }
}

/// Calculate CRC8-DVB-S2 checksum using the shared lookup table
///
/// # Examples
///
/// ```
/// use crsf_link::crsf::crc::crc8_dvb_s2;
///
/// // Type + 22 zero bytes of RC channel payload
/// let mut data = vec![0x16];
/// data.extend_from_slice(&[0u8; 22]);
/// assert_eq!(crc8_dvb_s2(&data), 239);
/// ```
pub fn crc8_dvb_s2(data: &[u8]) -> u8 {
    CRC8_DVB_S2.calculate(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Bit-by-bit reference, independent of the table
    fn crc8_slow(poly: u8, data: &[u8]) -> u8 {
        let mut crc: u8 = 0;

        for &byte in data {
            crc ^= byte;

            for _ in 0..8 {
                if (crc & 0x80) != 0 {
                    crc = (crc << 1) ^ poly;
                } else {
                    crc <<= 1;
                }
            }
        }

        crc
    }

    #[test]
    fn test_crc8_empty() {
        assert_eq!(crc8_dvb_s2(&[]), 0x00);
        assert_eq!(Crc8::new(0x07).calculate(&[]), 0x00);
    }

    #[test]
    fn test_crc8_check_value() {
        // Standard CRC-8/DVB-S2 check value
        assert_eq!(crc8_dvb_s2(b"123456789"), 0xBC);
    }

    #[test]
    fn test_crc8_header_bytes() {
        let data = [0xC8, 0x18, 0x16];
        assert_eq!(crc8_dvb_s2(&data), 0x71);
        assert_eq!(crc8_dvb_s2(&data), crc8_slow(CRC8_POLY_DVB_S2, &data));
    }

    #[test]
    fn test_crc8_known_frames() {
        let mut rc_zero = vec![0x16];
        rc_zero.extend_from_slice(&[0x00; 22]);
        assert_eq!(crc8_dvb_s2(&rc_zero), 239);

        let mut rc_max = vec![0x16];
        rc_max.extend_from_slice(&[0xFF; 22]);
        assert_eq!(crc8_dvb_s2(&rc_max), 143);

        let link_stats = [0x14, 16, 19, 99, 151, 1, 2, 3, 8, 88, 148];
        assert_eq!(crc8_dvb_s2(&link_stats), 252);
    }

    #[test]
    fn test_table_entries() {
        let table = CRC8_DVB_S2.table();
        assert_eq!(table[0], 0x00);
        assert_eq!(table[1], 0xD5);
        assert_eq!(table[2], 0x7F);
        assert_eq!(table[255], 0xF9);
        assert_eq!(CRC8_DVB_S2.polynomial(), 0xD5);
    }

    #[test]
    fn test_table_is_deterministic() {
        assert_eq!(Crc8::new(0xD5), Crc8::new(0xD5));
        assert_eq!(Crc8::new(0xD5).table(), CRC8_DVB_S2.table());
    }

    #[test]
    fn test_table_unchanged_by_calculate() {
        let crc = Crc8::new(0x31);
        let before = *crc.table();
        let _ = crc.calculate(&[0xFF, 0x00, 0x55, 0xAA]);
        assert_eq!(&before, crc.table());
    }

    #[test]
    fn test_lookup_matches_slow_for_other_polynomials() {
        let test_data = [
            vec![0x01, 0x02, 0x03],
            vec![0xFF, 0xFE, 0xFD],
            vec![0x16, 0xE0, 0x03],
            vec![0x00; 24],
            vec![0xFF; 10],
        ];

        for poly in [0x07, 0x31, 0x9B, 0xD5] {
            let crc = Crc8::new(poly);
            for data in test_data.iter() {
                assert_eq!(
                    crc.calculate(data),
                    crc8_slow(poly, data),
                    "CRC mismatch for poly 0x{:02X}, data: {:?}",
                    poly,
                    data
                );
            }
        }
    }

    #[test]
    fn test_crc8_changes_with_data() {
        let crc1 = crc8_dvb_s2(&[0x16, 0x00, 0x04]);
        let crc2 = crc8_dvb_s2(&[0x16, 0x00, 0x05]);

        assert_ne!(crc1, crc2, "CRC should change when data changes");
    }
}
