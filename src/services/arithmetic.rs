use crate::error::ServiceError;

/// n-th Fibonacci number, with fib(0) = 0 and fib(1) = 1.
pub fn fibonacci(n: i64) -> Result<i64, ServiceError> {
    if n < 0 {
        return Err(ServiceError::NegativeIndex(n));
    }
    if n < 2 {
        return Ok(n);
    }

    let (mut previous, mut current) = (0i64, 1i64);
    for _ in 2..=n {
        let next = previous
            .checked_add(current)
            .ok_or(ServiceError::Overflow(n))?;
        previous = current;
        current = next;
    }
    Ok(current)
}
