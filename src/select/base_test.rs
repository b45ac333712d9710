mod tests {
    use approx::assert_relative_eq;

    use crate::data::absorption::{AbsorptionRow, AbsorptionTable};
    use crate::data::model::{Filter, FilterGroup, FilterId, Material, StuckState};
    use crate::error::CalcError;
    use crate::select::{BaseSelector, SelectionMode};
    use crate::test_support::{flat_table, group_of, UNIT_MU};

    const ENERGY: f64 = 8000.0;

    fn floor() -> BaseSelector {
        BaseSelector::new(SelectionMode::Floor, 20)
    }

    /// Every candidate transmission of a group, brute force, for comparison.
    fn all_candidates(transmissions: &[f64]) -> Vec<f64> {
        (0..1u64 << transmissions.len())
            .map(|mask| {
                transmissions
                    .iter()
                    .enumerate()
                    .filter(|(bit, _)| mask & (1 << bit) != 0)
                    .fold(1.0, |acc, (_, t)| acc * t)
            })
            .collect()
    }

    #[test]
    fn test_doubling_diamond_stack_picks_floor() {
        // Thicknesses 10, 20, ..., 1280 um with mu * 10 um = 0.01: a subset of
        // total thickness 10k transmits exp(-0.01 k).  The largest value not
        // above 0.5 is k = 70 = 64 + 4 + 2.
        let table = flat_table(1000.0, 1000.0);
        let group = FilterGroup::new(
            (0..8)
                .map(|i| Filter::new(i + 1, Material::C, 10.0 * f64::from(1u32 << i)))
                .collect(),
        );

        let result = floor().select(&group, &table, 0.5, ENERGY).unwrap();

        let inserted: Vec<FilterId> = result.configuration.inserted().collect();
        // 20 um (id 2), 40 um (id 3), 640 um (id 7)
        assert_eq!(inserted, vec![FilterId(2), FilterId(3), FilterId(7)]);
        assert_relative_eq!(result.transmission, (-0.70f64).exp(), epsilon = 1e-12);
        assert!(result.transmission <= 0.5);
    }

    #[test]
    fn test_floor_property_over_targets() {
        let table = flat_table(UNIT_MU, UNIT_MU);
        let group = group_of(Material::Si, 1, &[0.9, 0.7, 0.45, 0.3, 0.12]);
        let transmissions: Vec<f64> = group
            .filters()
            .iter()
            .map(|f| table.filter_transmission(f, ENERGY).unwrap())
            .collect();
        let candidates = all_candidates(&transmissions);
        let min = candidates.iter().cloned().fold(f64::INFINITY, f64::min);

        for step in 0..=200 {
            let target = step as f64 / 200.0;
            let result = floor().select(&group, &table, target, ENERGY).unwrap();
            if target >= min {
                assert!(
                    result.transmission <= target,
                    "target {target}: got {}",
                    result.transmission
                );
                let best_below = candidates
                    .iter()
                    .cloned()
                    .filter(|t| *t <= target)
                    .fold(0.0, f64::max);
                assert_eq!(result.transmission, best_below);
            } else {
                assert_eq!(result.transmission, min);
            }
        }
    }

    #[test]
    fn test_target_below_minimum_inserts_everything() {
        let table = flat_table(UNIT_MU, UNIT_MU);
        let group = group_of(Material::C, 1, &[0.5, 0.5, 0.5]);

        let result = floor().select(&group, &table, 0.01, ENERGY).unwrap();
        assert_eq!(result.configuration.inserted_count(), 3);
        assert_relative_eq!(result.transmission, 0.125, epsilon = 1e-12);
    }

    #[test]
    fn test_target_one_inserts_nothing() {
        let table = flat_table(UNIT_MU, UNIT_MU);
        let group = group_of(Material::Si, 1, &[0.9, 0.5, 0.2]);

        for mode in [SelectionMode::Floor, SelectionMode::Ceiling] {
            let result = BaseSelector::new(mode, 20)
                .select(&group, &table, 1.0, ENERGY)
                .unwrap();
            assert_eq!(result.configuration.inserted_count(), 0);
            assert_eq!(result.transmission, 1.0);
        }
    }

    #[test]
    fn test_only_forced_out_or_inactive_gives_unity() {
        let table = flat_table(UNIT_MU, UNIT_MU);
        let group = FilterGroup::new(vec![
            Filter::new(1, Material::Si, 1.0).with_stuck(StuckState::ForcedOut),
            Filter::new(2, Material::Si, 2.0).inactive(),
        ]);

        for target in [0.0, 0.3, 1.0] {
            let result = floor().select(&group, &table, target, ENERGY).unwrap();
            assert_eq!(result.transmission, 1.0);
            assert_eq!(result.configuration.inserted_count(), 0);
            assert_eq!(result.configuration.len(), 2);
        }
    }

    #[test]
    fn test_zero_thickness_blade_pinned_out_is_ignored() {
        let table = flat_table(UNIT_MU, UNIT_MU);
        let mut group = group_of(Material::C, 1, &[0.5]);
        group.extend(&FilterGroup::new(vec![
            Filter::new(2, Material::C, 0.0).with_stuck(StuckState::ForcedOut),
        ]));

        let result = floor().select(&group, &table, 0.6, ENERGY).unwrap();
        assert_eq!(result.configuration.is_inserted(FilterId(1)), Some(true));
        assert_eq!(result.configuration.is_inserted(FilterId(2)), Some(false));
    }

    #[test]
    fn test_forced_in_factor_applies_to_every_candidate() {
        let table = flat_table(UNIT_MU, UNIT_MU);
        let mut filters = group_of(Material::Si, 1, &[0.8, 0.6]).filters().to_vec();
        filters.push(
            Filter::new(3, Material::Si, crate::test_support::thickness_for(0.5))
                .with_stuck(StuckState::ForcedIn),
        );
        let group = FilterGroup::new(filters);

        // Reachable: 0.5, 0.4, 0.3, 0.24 (all include the stuck 0.5).
        let result = floor().select(&group, &table, 1.0, ENERGY).unwrap();
        assert_relative_eq!(result.transmission, 0.5, epsilon = 1e-12);
        assert_eq!(result.configuration.is_inserted(FilterId(3)), Some(true));

        let result = floor().select(&group, &table, 0.35, ENERGY).unwrap();
        assert_relative_eq!(result.transmission, 0.3, epsilon = 1e-12);
        assert_eq!(result.configuration.is_inserted(FilterId(2)), Some(true));

        let result = floor().select(&group, &table, 0.1, ENERGY).unwrap();
        assert_relative_eq!(result.transmission, 0.24, epsilon = 1e-12);
        assert_eq!(result.configuration.inserted_count(), 3);
    }

    #[test]
    fn test_ties_prefer_fewer_filters() {
        // Silicon with mu = 0: inserting it changes nothing.
        let table = AbsorptionTable::from_rows([
            AbsorptionRow { material: Material::C, energy_ev: 1000.0, mu: UNIT_MU },
            AbsorptionRow { material: Material::C, energy_ev: 30000.0, mu: UNIT_MU },
            AbsorptionRow { material: Material::Si, energy_ev: 1000.0, mu: 0.0 },
            AbsorptionRow { material: Material::Si, energy_ev: 30000.0, mu: 0.0 },
        ])
        .unwrap();
        let group = FilterGroup::new(vec![
            Filter::new(1, Material::Si, 100.0),
            Filter::new(2, Material::C, crate::test_support::thickness_for(0.5)),
        ]);

        let result = floor().select(&group, &table, 0.7, ENERGY).unwrap();
        assert_eq!(
            result.configuration.inserted().collect::<Vec<_>>(),
            vec![FilterId(2)]
        );
    }

    #[test]
    fn test_identical_filters_resolve_deterministically() {
        let table = flat_table(UNIT_MU, UNIT_MU);
        let group = group_of(Material::C, 1, &[0.5, 0.5]);

        let first = floor().select(&group, &table, 0.6, ENERGY).unwrap();
        let second = floor().select(&group, &table, 0.6, ENERGY).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            first.configuration.inserted().collect::<Vec<_>>(),
            vec![FilterId(1)]
        );
    }

    #[test]
    fn test_ceiling_mode() {
        let table = flat_table(UNIT_MU, UNIT_MU);
        let group = group_of(Material::Si, 1, &[0.8, 0.5]);
        let ceiling = BaseSelector::new(SelectionMode::Ceiling, 20);

        // Candidates 1.0, 0.8, 0.5, 0.4
        let result = ceiling.select(&group, &table, 0.6, ENERGY).unwrap();
        assert_relative_eq!(result.transmission, 0.8, epsilon = 1e-12);

        let result = floor().select(&group, &table, 0.6, ENERGY).unwrap();
        assert_relative_eq!(result.transmission, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_invalid_requests() {
        let table = flat_table(UNIT_MU, UNIT_MU);
        let group = group_of(Material::Si, 1, &[0.5]);

        assert_eq!(
            floor().select(&group, &table, 1.2, ENERGY).unwrap_err(),
            CalcError::InvalidTarget(1.2)
        );
        assert!(matches!(
            floor().select(&group, &table, -0.2, ENERGY),
            Err(CalcError::InvalidTarget(_))
        ));
        assert!(matches!(
            floor().select(&group, &table, 0.5, 50.0),
            Err(CalcError::OutOfRange { material: Material::Si, .. })
        ));
    }

    #[test]
    fn test_group_too_large() {
        let table = flat_table(UNIT_MU, UNIT_MU);
        let group = group_of(Material::Si, 1, &[0.9; 5]);

        let err = BaseSelector::new(SelectionMode::Floor, 4)
            .select(&group, &table, 0.5, ENERGY)
            .unwrap_err();
        assert_eq!(err, CalcError::GroupTooLarge { free: 5, max: 4 });
    }
}
