mod tests {
    use approx::assert_relative_eq;

    use crate::data::absorption::{AbsorptionRow, AbsorptionTable};
    use crate::data::model::{Filter, Material};
    use crate::error::CalcError;

    fn row(material: Material, energy_ev: f64, mu: f64) -> AbsorptionRow {
        AbsorptionRow {
            material,
            energy_ev,
            mu,
        }
    }

    fn diamond_table() -> AbsorptionTable {
        // Deliberately unordered.
        AbsorptionTable::from_rows(vec![
            row(Material::C, 3000.0, 100.0),
            row(Material::C, 1000.0, 300.0),
            row(Material::C, 2000.0, 200.0),
        ])
        .unwrap()
    }

    #[test]
    fn test_attenuation_at_tabulated_points() {
        let table = diamond_table();
        assert_relative_eq!(table.attenuation(Material::C, 1000.0).unwrap(), 300.0);
        assert_relative_eq!(table.attenuation(Material::C, 2000.0).unwrap(), 200.0);
        assert_relative_eq!(table.attenuation(Material::C, 3000.0).unwrap(), 100.0);
    }

    #[test]
    fn test_attenuation_interpolates_linearly() {
        let table = diamond_table();
        assert_relative_eq!(table.attenuation(Material::C, 1500.0).unwrap(), 250.0);
        assert_relative_eq!(table.attenuation(Material::C, 2750.0).unwrap(), 125.0);
    }

    #[test]
    fn test_beer_lambert_transmission() {
        let table = diamond_table();
        // 100 um at mu = 200 /m -> exp(-0.02)
        let t = table.transmission(Material::C, 100.0, 2000.0).unwrap();
        assert_relative_eq!(t, (-0.02f64).exp(), epsilon = 1e-15);

        let filter = Filter::new(2, Material::C, 100.0);
        assert_eq!(table.filter_transmission(&filter, 2000.0).unwrap(), t);
    }

    #[test]
    fn test_out_of_range_energy() {
        let table = diamond_table();
        let err = table.transmission(Material::C, 10.0, 999.0).unwrap_err();
        assert_eq!(
            err,
            CalcError::OutOfRange {
                material: Material::C,
                energy_ev: 999.0,
                min_ev: 1000.0,
                max_ev: 3000.0,
            }
        );
        assert!(table.attenuation(Material::C, 3000.5).is_err());
        assert_eq!(table.domain(Material::C).unwrap(), (1000.0, 3000.0));
    }

    #[test]
    fn test_missing_material_and_bad_energy() {
        let table = diamond_table();
        assert_eq!(
            table.attenuation(Material::Si, 2000.0).unwrap_err(),
            CalcError::NoAbsorptionData(Material::Si)
        );
        assert!(matches!(
            table.attenuation(Material::C, 0.0),
            Err(CalcError::InvalidEnergy(_))
        ));
        assert!(matches!(
            table.attenuation(Material::C, f64::NAN),
            Err(CalcError::InvalidEnergy(_))
        ));
        assert_eq!(table.materials().collect::<Vec<_>>(), vec![Material::C]);
    }

    #[test]
    fn test_closest_energy_clamps_and_rounds() {
        let table = diamond_table();
        assert_eq!(table.closest_energy(Material::C, 10.0).unwrap(), (1000.0, 0));
        assert_eq!(table.closest_energy(Material::C, 1400.0).unwrap(), (1000.0, 0));
        assert_eq!(table.closest_energy(Material::C, 1600.0).unwrap(), (2000.0, 1));
        assert_eq!(table.closest_energy(Material::C, 2000.0).unwrap(), (2000.0, 1));
        assert_eq!(table.closest_energy(Material::C, 9e9).unwrap(), (3000.0, 2));
    }

    #[test]
    fn test_rejects_invalid_rows() {
        let duplicate = AbsorptionTable::from_rows(vec![
            row(Material::Si, 1000.0, 1.0),
            row(Material::Si, 1000.0, 2.0),
        ]);
        assert!(matches!(duplicate, Err(CalcError::InvalidTable(_))));

        let negative = AbsorptionTable::from_rows(vec![row(Material::Si, 1000.0, -1.0)]);
        assert!(matches!(negative, Err(CalcError::InvalidTable(_))));

        let zero_energy = AbsorptionTable::from_rows(vec![row(Material::Si, 0.0, 1.0)]);
        assert!(matches!(zero_energy, Err(CalcError::InvalidTable(_))));
    }
}
