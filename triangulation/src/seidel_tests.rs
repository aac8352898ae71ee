use crate::math::{point, Point};
use crate::{
    FillRule, Outline, PointId, TrapezoidationInfo, TriangulateOutput, TriangulationError,
    TriangulationInfo, TriangulationState, Triangulator, Winding,
};

fn build_and_triangulate(
    outlines: &[Outline],
    fill_rule: FillRule,
    winding: Winding,
) -> (Triangulator, TriangulateOutput) {
    let mut triangulator = Triangulator::new(outlines);
    assert!(triangulator.is_simple_polygon());

    let mut trap_info = TrapezoidationInfo::default();
    trap_info.fill_rule = fill_rule;
    // The scenario expectations assume a fixed insertion order.
    trap_info.randomize_segments = false;

    triangulator.build_trapezoid_tree(&mut trap_info).unwrap();
    assert!(trap_info.completed);

    let mut tri_info = TriangulationInfo::default();
    tri_info.winding = winding;

    let mut output = TriangulateOutput::new();
    triangulator.triangulate(&mut tri_info, &mut output).unwrap();
    assert_eq!(tri_info.state, TriangulationState::FinishedAll);

    (triangulator, output)
}

fn signed_area(t: &Triangulator, tri: &[PointId]) -> f32 {
    let a = t.position(tri[0]);
    let b = t.position(tri[1]);
    let c = t.position(tri[2]);
    0.5 * ((b.x - a.x) * (c.y - a.y) - (c.x - a.x) * (b.y - a.y))
}

fn point_in_triangle(pt: Point, a: Point, b: Point, c: Point) -> bool {
    fn sign(p1: Point, p2: Point, p3: Point) -> f32 {
        (p1.x - p3.x) * (p2.y - p3.y) - (p2.x - p3.x) * (p1.y - p3.y)
    }

    let d1 = sign(pt, a, b);
    let d2 = sign(pt, b, c);
    let d3 = sign(pt, c, a);

    let has_neg = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_pos = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;

    !(has_neg && has_pos)
}

fn containing_triangles(t: &Triangulator, output: &TriangulateOutput, pt: Point) -> usize {
    output
        .triangles
        .chunks(3)
        .filter(|tri| {
            point_in_triangle(
                pt,
                t.position(tri[0]),
                t.position(tri[1]),
                t.position(tri[2]),
            )
        })
        .count()
}

fn even_odd_inside(outlines: &[Outline], pt: Point) -> bool {
    let mut inside = false;
    for outline in outlines {
        let n = outline.len();
        let mut j = n - 1;
        for i in 0..n {
            let pi = outline[i];
            let pj = outline[j];
            if ((pi.y <= pt.y && pt.y < pj.y) || (pj.y <= pt.y && pt.y < pi.y))
                && pt.x < (pj.x - pi.x) * (pt.y - pi.y) / (pj.y - pi.y) + pi.x
            {
                inside = !inside;
            }
            j = i;
        }
    }
    inside
}

fn assert_valid_indices(output: &TriangulateOutput, num_points: usize) {
    for tri in output.triangles.chunks(3) {
        assert_eq!(tri.len(), 3);
        for id in tri {
            assert!(id.to_usize() < num_points);
        }
        assert_ne!(tri[0], tri[1]);
        assert_ne!(tri[1], tri[2]);
        assert_ne!(tri[0], tri[2]);
    }
}

/// Each emitted triangle's centroid must land in that triangle only (the
/// interiors are disjoint) and must be classified inside by the fill rule
/// (the triangles cover only the interior).
fn assert_partition(t: &Triangulator, output: &TriangulateOutput, outlines: &[Outline]) {
    for tri in output.triangles.chunks(3) {
        let pts = [t.position(tri[0]), t.position(tri[1]), t.position(tri[2])];
        let centroid = crate::geom::centroid(&pts);
        assert_eq!(
            containing_triangles(t, output, centroid),
            1,
            "centroid {:?} is covered more than once",
            centroid
        );
        assert!(
            even_odd_inside(outlines, centroid),
            "centroid {:?} of an emitted triangle is outside the polygon",
            centroid
        );
    }
}

fn triangle_outline() -> Outline {
    vec![point(0.0, 0.0), point(1.0, 0.0), point(0.0, 1.0)]
}

fn square_outline() -> Outline {
    vec![
        point(0.0, 0.0),
        point(1.0, 0.0),
        point(1.0, 1.0),
        point(0.0, 1.0),
    ]
}

fn square_with_hole() -> Vec<Outline> {
    vec![
        vec![
            point(0.0, 0.0),
            point(4.0, 0.0),
            point(4.0, 4.0),
            point(0.0, 4.0),
        ],
        vec![
            point(1.0, 1.0),
            point(1.0, 3.0),
            point(3.0, 3.0),
            point(3.0, 1.0),
        ],
    ]
}

fn concave_c() -> Outline {
    vec![
        point(0.0, 0.0),
        point(3.0, 0.0),
        point(3.0, 1.0),
        point(1.0, 1.0),
        point(1.0, 2.0),
        point(3.0, 2.0),
        point(3.0, 3.0),
        point(0.0, 3.0),
    ]
}

#[test]
fn single_triangle() {
    let outlines = [triangle_outline()];
    let (t, output) = build_and_triangulate(&outlines, FillRule::EvenOdd, Winding::Ccw);

    assert_eq!(output.triangle_count(), 1);
    assert_eq!(output.diagonal_count(), 0);
    assert_valid_indices(&output, 3);

    let mut ids: Vec<u32> = output.triangles.iter().map(|id| id.0).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![0, 1, 2]);

    assert!(signed_area(&t, &output.triangles) > 0.0);
    assert_eq!(t.outline_windings(), &[Winding::Ccw]);
}

#[test]
fn square_two_triangles() {
    let outlines = [square_outline()];
    let (t, output) = build_and_triangulate(&outlines, FillRule::EvenOdd, Winding::Ccw);

    assert_eq!(output.triangle_count(), 2);
    assert_eq!(output.diagonal_count(), 1);
    assert_valid_indices(&output, 4);
    assert_partition(&t, &output, &outlines);

    // The two triangles tile the unit square.
    let total: f32 = output
        .triangles
        .chunks(3)
        .map(|tri| signed_area(&t, tri))
        .sum();
    assert!((total - 1.0).abs() < 1e-6);
}

#[test]
fn square_with_square_hole() {
    let outlines = square_with_hole();
    let (t, output) = build_and_triangulate(&outlines, FillRule::EvenOdd, Winding::Ccw);

    assert_eq!(output.triangle_count(), 8);
    assert_valid_indices(&output, 8);
    assert_partition(&t, &output, &outlines);

    // Opposite windings: the inner outline is a hole.
    assert_eq!(t.outline_windings(), &[Winding::Ccw, Winding::Cw]);

    // The hole and the outside stay uncovered.
    assert_eq!(containing_triangles(&t, &output, point(2.0, 2.0)), 0);
    assert_eq!(containing_triangles(&t, &output, point(-1.0, 2.0)), 0);
    assert_eq!(containing_triangles(&t, &output, point(5.0, 5.0)), 0);

    // The ring area is fully accounted for.
    let total: f32 = output
        .triangles
        .chunks(3)
        .map(|tri| signed_area(&t, tri))
        .sum();
    assert!((total - 12.0).abs() < 1e-4);
}

#[test]
fn concave_outline() {
    let outlines = [concave_c()];
    let (t, output) = build_and_triangulate(&outlines, FillRule::EvenOdd, Winding::Ccw);

    assert_eq!(output.triangle_count(), 6);
    assert_valid_indices(&output, 8);
    assert_partition(&t, &output, &outlines);

    for tri in output.triangles.chunks(3) {
        assert!(signed_area(&t, tri) > 0.0);
    }
}

#[test]
fn concave_outline_clockwise_output() {
    let outlines = [concave_c()];
    let (t, output) = build_and_triangulate(&outlines, FillRule::EvenOdd, Winding::Cw);

    assert_eq!(output.triangle_count(), 6);
    for tri in output.triangles.chunks(3) {
        assert!(signed_area(&t, tri) < 0.0);
    }
}

#[test]
fn bow_tie_is_rejected() {
    let mut t = Triangulator::new(&[vec![
        point(0.0, 0.0),
        point(2.0, 2.0),
        point(2.0, 0.0),
        point(0.0, 2.0),
    ]]);
    assert!(!t.is_simple_polygon());

    let mut info = TrapezoidationInfo::default();
    assert_eq!(
        t.build_trapezoid_tree(&mut info),
        Err(TriangulationError::NotSimplePolygon)
    );

    let mut tri_info = TriangulationInfo::default();
    let mut output = TriangulateOutput::new();
    assert_eq!(
        t.triangulate(&mut tri_info, &mut output),
        Err(TriangulationError::NoTrapezoidTree)
    );
}

#[test]
fn collinear_horizontal_points() {
    let outlines = [vec![
        point(0.0, 0.0),
        point(1.0, 0.0),
        point(2.0, 0.0),
        point(2.0, 1.0),
        point(0.0, 1.0),
    ]];
    let (t, output) = build_and_triangulate(&outlines, FillRule::EvenOdd, Winding::Ccw);

    assert_eq!(output.triangle_count(), 3);
    assert_valid_indices(&output, 5);
    assert_partition(&t, &output, &outlines);
}

#[test]
fn fill_rules_on_nested_same_winding_outlines() {
    // Both outlines counter clockwise: under non-zero the inner square is
    // filled, under even-odd it is a hole.
    let outlines = vec![
        vec![
            point(0.0, 0.0),
            point(4.0, 0.0),
            point(4.0, 4.0),
            point(0.0, 4.0),
        ],
        vec![
            point(1.0, 1.0),
            point(3.0, 1.0),
            point(3.0, 3.0),
            point(1.0, 3.0),
        ],
    ];

    let (t, output) = build_and_triangulate(&outlines, FillRule::NonZero, Winding::Ccw);
    assert_eq!(containing_triangles(&t, &output, point(2.0, 2.0)), 1);

    let (t, output) = build_and_triangulate(&outlines, FillRule::EvenOdd, Winding::Ccw);
    assert_eq!(containing_triangles(&t, &output, point(2.0, 2.0)), 0);
}

#[test]
fn trapezoid_count_stays_linear() {
    for seed in 0..8u64 {
        let outlines = square_with_hole();
        let mut t = Triangulator::new(&outlines);
        assert!(t.is_simple_polygon());

        let mut info = TrapezoidationInfo::default();
        info.seed = Some(seed);
        t.build_trapezoid_tree(&mut info).unwrap();

        let n = t.segments().len();
        assert!(
            t.trapezoid_count() <= 4 * n + 1,
            "{} trapezoids for {} segments",
            t.trapezoid_count(),
            n
        );
    }
}

#[test]
fn deterministic_with_seed() {
    let outlines = [concave_c()];

    let run = |seed: u64| {
        let mut t = Triangulator::new(&outlines);
        let mut trap_info = TrapezoidationInfo::default();
        trap_info.seed = Some(seed);
        t.build_trapezoid_tree(&mut trap_info).unwrap();

        let mut tri_info = TriangulationInfo::default();
        let mut output = TriangulateOutput::new();
        t.triangulate(&mut tri_info, &mut output).unwrap();
        (trap_info.segment_order, output)
    };

    let (order_a, out_a) = run(1234);
    let (order_b, out_b) = run(1234);

    assert_eq!(order_a, order_b);
    assert_eq!(out_a.triangles, out_b.triangles);
    assert_eq!(out_a.diagonals, out_b.diagonals);
    assert_eq!(out_a.monotone_chains, out_b.monotone_chains);

    // A different seed is allowed to produce a different (but equally
    // valid) triangulation; it must at least keep the triangle count.
    let (_, out_c) = run(99);
    assert_eq!(out_c.triangle_count(), out_a.triangle_count());
}

/// Running with a step bound, resuming until completion, must produce
/// exactly the same output as one unbounded run, and the bounded step
/// counts must add up to the unbounded one.
#[test]
fn step_wise_equivalence() {
    let outlines = square_with_hole();

    // Unbounded reference run.
    let mut reference = Triangulator::new(&outlines);
    let mut ref_trap = TrapezoidationInfo::default();
    ref_trap.seed = Some(7);
    reference.build_trapezoid_tree(&mut ref_trap).unwrap();
    let mut ref_tri = TriangulationInfo::default();
    let mut ref_out = TriangulateOutput::new();
    reference.triangulate(&mut ref_tri, &mut ref_out).unwrap();

    for chunk in &[1, 2, 3, 7] {
        let mut t = Triangulator::new(&outlines);

        let mut trap_info = TrapezoidationInfo::default();
        trap_info.segment_order = ref_trap.segment_order.clone();
        trap_info.max_steps = *chunk;

        let mut build_steps = 0;
        while !trap_info.completed {
            t.build_trapezoid_tree(&mut trap_info).unwrap();
            assert!(trap_info.num_steps as i32 <= *chunk);
            build_steps += trap_info.num_steps;
        }
        assert_eq!(build_steps, ref_trap.num_steps);

        let mut tri_info = TriangulationInfo::default();
        tri_info.max_steps = *chunk;

        let mut output = TriangulateOutput::new();
        let mut tri_steps = 0;
        while tri_info.state != TriangulationState::FinishedAll {
            t.triangulate(&mut tri_info, &mut output).unwrap();
            tri_steps += tri_info.num_steps;
        }
        assert_eq!(tri_steps, ref_tri.num_steps);

        assert_eq!(output.triangles, ref_out.triangles);
        assert_eq!(output.diagonals, ref_out.diagonals);
        assert_eq!(output.monotone_chains, ref_out.monotone_chains);
    }
}

#[test]
fn step_wise_checkpoint_fields() {
    let outlines = [square_outline()];
    let mut t = Triangulator::new(&outlines);

    let mut info = TrapezoidationInfo::default();
    info.randomize_segments = false;
    info.max_steps = 1;

    // After one step the first segment's upper endpoint is in.
    t.build_trapezoid_tree(&mut info).unwrap();
    assert_eq!(info.num_steps, 1);
    assert!(!info.completed);
    assert!(info.upper_point.is_some());

    // Keep going; at some pause the build must be mid-thread.
    let mut saw_threading = false;
    while !info.completed {
        t.build_trapezoid_tree(&mut info).unwrap();
        if info.threading_segment.is_some() {
            assert!(info.upper_point.is_some());
            assert!(info.lower_point.is_some());
            saw_threading = true;
        }
    }
    assert!(saw_threading);
    assert!(info.threading_segment.is_none());
}

#[test]
fn rebuild_after_completion() {
    let outlines = [concave_c()];
    let mut t = Triangulator::new(&outlines);

    let mut info = TrapezoidationInfo::default();
    info.seed = Some(3);

    t.build_trapezoid_tree(&mut info).unwrap();
    let first_count = t.trapezoid_count();

    // A second call with the same (now filled in) segment order rebuilds
    // the same map.
    t.build_trapezoid_tree(&mut info).unwrap();
    assert!(info.completed);
    assert_eq!(t.trapezoid_count(), first_count);

    let mut tri_info = TriangulationInfo::default();
    let mut output = TriangulateOutput::new();
    t.triangulate(&mut tri_info, &mut output).unwrap();
    assert_eq!(output.triangle_count(), 6);

    t.delete_trapezoid_tree();
    assert!(t.tree_root().is_none());
    assert_eq!(t.trapezoid_count(), 0);
    assert_eq!(
        t.triangulate(&mut tri_info, &mut output),
        Err(TriangulationError::NoTrapezoidTree)
    );
}

#[test]
fn interior_trapezoids_are_fully_bounded() {
    let outlines = square_with_hole();
    let mut t = Triangulator::new(&outlines);
    let mut info = TrapezoidationInfo::default();
    info.seed = Some(11);
    t.build_trapezoid_tree(&mut info).unwrap();

    let mut inside_count = 0;
    for (_, trap) in t.trapezoids() {
        if trap.inside {
            inside_count += 1;
            assert!(trap.upper_point.is_some());
            assert!(trap.lower_point.is_some());
            assert!(trap.left_segment.is_some());
            assert!(trap.right_segment.is_some());
        }
    }

    // The ring interior decomposes into at least four trapezoids.
    assert!(inside_count >= 4);
}
