//! Plain-text summaries of a solved run.

use std::fmt::Write;

use nlte_core::SpeciesKey;
use nlte_solver::NlteSolution;

pub fn print_solution(solution: &NlteSolution) {
    print!("{}", format_solution(solution));
}

/// One block per shell: electron density, iterations, then every ion with its
/// fraction of the element.
pub fn format_solution(solution: &NlteSolution) -> String {
    let table = &solution.ion_number_densities;
    let mut out = String::new();

    for shell in 0..solution.num_shells() {
        let _ = writeln!(
            out,
            "Shell {}: n_e = {:.6e} ({} iterations)",
            shell, solution.electron_densities[shell], solution.iterations[shell]
        );
        for (row, species) in table.keys().iter().enumerate() {
            let density = table.values()[(row, shell)];
            let total = element_total(solution, species.atomic_number, shell);
            let fraction = if total > 0.0 { density / total } else { 0.0 };
            let _ = writeln!(
                out,
                "  Z={:<3} ion={:<3} {:>14.6e}  {:>8.4}%",
                species.atomic_number,
                species.ion_number,
                density,
                100.0 * fraction
            );
        }
    }
    out
}

fn element_total(solution: &NlteSolution, atomic_number: u32, shell: usize) -> f64 {
    (0..=atomic_number)
        .filter_map(|ion| {
            solution
                .ion_number_densities
                .get(&SpeciesKey::new(atomic_number, ion), shell)
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use nlte_core::IonTable;

    #[test]
    fn test_format_solution() {
        let table = IonTable::from_records(
            1,
            vec![
                (SpeciesKey::new(1, 0), vec![7.5e9]),
                (SpeciesKey::new(1, 1), vec![2.5e9]),
            ],
        )
        .unwrap();
        let solution = NlteSolution {
            ion_number_densities: table,
            electron_densities: vec![2.5e9],
            iterations: vec![6],
        };

        let text = format_solution(&solution);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "Shell 0: n_e = 2.500000e9 (6 iterations)");
        assert!(lines[1].contains("ion=0"));
        assert!(lines[1].ends_with("75.0000%"));
        assert!(lines[2].ends_with("25.0000%"));
    }
}
