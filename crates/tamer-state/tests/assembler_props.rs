use proptest::prelude::*;
use tamer_protocol::{InventoryPet, PetInventoryFragment};
use tamer_state::{AssemblerState, FragmentAssembler, FragmentOutcome};

fn listing(ids: &[i64]) -> Vec<InventoryPet> {
    ids.iter()
        .map(|&id| InventoryPet {
            id,
            name: format!("pet-{id}"),
            type_id: 0,
            palette_id: 0,
            color: String::new(),
            breed_id: 0,
            custom_parts: Vec::new(),
            level: 1,
        })
        .collect()
}

proptest! {
    #[test]
    fn in_order_sequence_yields_concatenation(
        ids in proptest::collection::vec(any::<i32>(), 0..60),
        chunk in 1usize..8,
    ) {
        let ids: Vec<i64> = ids.into_iter().map(i64::from).collect();
        let pets = listing(&ids);
        let fragments = PetInventoryFragment::split(&pets, chunk);
        let last = fragments.len() - 1;

        let mut assembler = FragmentAssembler::new();
        for (i, fragment) in fragments.into_iter().enumerate() {
            let outcome = assembler.push(fragment);
            if i == last {
                prop_assert_eq!(outcome, FragmentOutcome::Complete(pets.clone()));
            } else {
                let is_pending = matches!(outcome, FragmentOutcome::Pending { .. });
                prop_assert!(is_pending);
            }
        }
        prop_assert_eq!(assembler.state(), &AssemblerState::Idle);
    }

    #[test]
    fn gap_never_completes_until_restart(
        count in 3usize..20,
        skip in 1usize..19,
    ) {
        prop_assume!(skip < count);
        let ids: Vec<i64> = (0..count as i64).collect();
        let pets = listing(&ids);
        let fragments = PetInventoryFragment::split(&pets, 1);

        let mut assembler = FragmentAssembler::new();
        for (i, fragment) in fragments.iter().cloned().enumerate() {
            if i == skip {
                continue;
            }
            let completed = matches!(assembler.push(fragment), FragmentOutcome::Complete(_));
            prop_assert!(!completed);
        }

        // Restart from zero recovers cleanly
        let mut outcome = None;
        for fragment in fragments {
            outcome = Some(assembler.push(fragment));
        }
        prop_assert_eq!(outcome, Some(FragmentOutcome::Complete(pets)));
    }
}
