/*!
Tests for the collision grouping of jobs
 */

use std::collections::BTreeSet;
use fabric_routing::fairness::grouping::{group_jobs, jobs_collide};
use fabric_routing::fairness::jobs::Job;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_job(id: usize, rng: &mut StdRng) -> Job
{
    let start = rng.gen_range(0..100u64);
    let tors: BTreeSet<usize> = (0..rng.gen_range(1..4)).map(|_| rng.gen_range(0..8)).collect();
    Job{ id, virtual_links: vec![], tors, start_time: start, flow_size: 1.0, end_time: start + rng.gen_range(1..30) }
}

#[test]
fn jobs_in_different_groups_never_collide()
{
    for seed in 0..50u64
    {
        let mut rng = StdRng::seed_from_u64(seed);
        let jobs: Vec<Job> = (0..rng.gen_range(1..25)).map(|id| random_job(id, &mut rng)).collect();
        let groups = group_jobs(&jobs);
        let mut seen: Vec<usize> = groups.iter().flatten().copied().collect();
        seen.sort();
        assert_eq!(seen, (0..jobs.len()).collect::<Vec<_>>(), "every job in exactly one group");
        let mut group_of = vec![0; jobs.len()];
        for (g, group) in groups.iter().enumerate()
        {
            for &job in group
            {
                group_of[job] = g;
            }
        }
        for a in 0..jobs.len()
        {
            for b in a + 1..jobs.len()
            {
                if group_of[a] != group_of[b]
                {
                    assert!(!jobs_collide(&jobs[a], &jobs[b]), "seed {}: jobs {} and {} collide", seed, a, b);
                }
            }
        }
        //Groups are connected: every job of a larger group collides with another of it.
        for group in groups.iter().filter(|g| g.len() > 1)
        {
            for &a in group
            {
                assert!(group.iter().any(|&b| b != a && jobs_collide(&jobs[a], &jobs[b])));
            }
        }
    }
}
