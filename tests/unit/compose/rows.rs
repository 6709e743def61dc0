use super::*;

fn gradient_row(width: u32) -> impl Fn(u32, &mut [f32]) + Sync {
    move |y, row| {
        for x in 0..width as usize {
            let v = (x as f32 + y as f32 * 0.5) / 100.0;
            row[x * 4..x * 4 + 4].copy_from_slice(&[v, 1.0 - v, 0.25, 1.0]);
        }
    }
}

#[test]
fn sequential_and_parallel_are_identical() {
    let seq = RowDriver::sequential().run(33, 41, gradient_row(33)).unwrap();

    let pool = build_thread_pool(Some(3)).unwrap();
    let par = RowDriver::new(Some(&pool), None)
        .run(33, 41, gradient_row(33))
        .unwrap();
    assert_eq!(seq, par);
}

#[test]
fn progress_is_monotonic_and_completes() {
    let mut reports = Vec::new();
    let mut cb = |p: Progress| reports.push(p);
    RowDriver::new(None, Some(&mut cb as &mut dyn FnMut(Progress)))
        .run(4, 100, gradient_row(4))
        .unwrap();

    assert_eq!(reports.len(), 20);
    assert!(reports.windows(2).all(|w| w[0].rows_done < w[1].rows_done));
    let last = reports.last().unwrap();
    assert_eq!(last.rows_done, 100);
    assert_eq!(last.fraction(), 1.0);
}

#[test]
fn tiny_images_report_every_row() {
    let mut count = 0;
    let mut cb = |_p: Progress| count += 1;
    RowDriver::new(None, Some(&mut cb as &mut dyn FnMut(Progress)))
        .run(2, 3, gradient_row(2))
        .unwrap();
    assert_eq!(count, 3);
}

#[test]
fn zero_threads_is_rejected() {
    assert!(matches!(
        build_thread_pool(Some(0)),
        Err(RepackError::Validation(_))
    ));
}

#[test]
fn zero_size_is_dimension_error() {
    assert!(matches!(
        RowDriver::sequential().run(0, 4, gradient_row(0)),
        Err(RepackError::Dimension(_))
    ));
}
